//! Fills blank state / ZIP (and city) cells of a listings export.

use std::{
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::{Reader, StringRecord, Writer};
use itertools::Itertools;
use log::{debug, warn};

use crate::{
    geocode::{Resolve, Throttle},
    utils::progress_bar,
};

/// Header names of the columns the job reads and writes.
#[derive(Clone, Debug)]
pub struct Columns {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Default for Columns {
    fn default() -> Self {
        // trailing spaces are part of the export's headers
        Columns {
            address: "Property Address ".to_string(),
            city: "Property city ".to_string(),
            state: "state".to_string(),
            zip: "Zip code ".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub rows: usize,
    pub needed: usize,
    pub resolved: usize,
    pub failed: usize,
    pub skipped: usize,
}

struct Index {
    address: usize,
    city: usize,
    state: usize,
    zip: usize,
}

impl Index {
    fn find(headers: &StringRecord, columns: &Columns) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|x| x == name)
                .with_context(|| format!("Missing column {name:?}"))
        };

        Ok(Index {
            address: position(&columns.address)?,
            city: position(&columns.city)?,
            state: position(&columns.state)?,
            zip: position(&columns.zip)?,
        })
    }
}

enum Outcome {
    Complete,
    Skipped,
    Resolved,
    Failed,
}

pub fn run(input: &Path, output: &Path, columns: &Columns, resolver: &dyn Resolve) -> Result<Summary> {
    let reader = Reader::from_path(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut writer = Writer::from_path(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    backfill(reader, &mut writer, columns, resolver)
}

pub fn backfill<R: Read, W: Write>(
    mut reader: Reader<R>,
    writer: &mut Writer<W>,
    columns: &Columns,
    resolver: &dyn Resolve,
) -> Result<Summary> {
    let headers = reader.headers()?.clone();
    let index = Index::find(&headers, columns)?;
    let records: Vec<StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .context("Failed to read rows")?;

    writer.write_record(&headers)?;

    let mut summary = Summary::default();
    let mut throttle = Throttle::new(resolver.min_interval());
    let pb = progress_bar(records.len() as u64);
    for record in records {
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        summary.rows += 1;
        match fill_row(&mut row, &index, resolver, &mut throttle) {
            Outcome::Complete => {}
            Outcome::Skipped => {
                summary.needed += 1;
                summary.skipped += 1;
            }
            Outcome::Resolved => {
                summary.needed += 1;
                summary.resolved += 1;
            }
            Outcome::Failed => {
                summary.needed += 1;
                summary.failed += 1;
            }
        }
        writer.write_record(&row)?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    writer.flush()?;

    Ok(summary)
}

fn fill_row(
    row: &mut [String],
    index: &Index,
    resolver: &dyn Resolve,
    throttle: &mut Throttle,
) -> Outcome {
    if !row[index.state].trim().is_empty() && !row[index.zip].trim().is_empty() {
        return Outcome::Complete;
    }

    let address = row[index.address].trim().to_string();
    if address.is_empty() {
        return Outcome::Skipped;
    }

    let mut query = address.clone();
    for i in [index.city, index.state] {
        let part = row[i].trim();
        if !part.is_empty() && !address.contains(part) {
            query.push_str(", ");
            query.push_str(part);
        }
    }

    debug!("Geocoding: {query}");
    throttle.wait();
    let location = resolver.resolve(&query);
    if location.is_empty() {
        warn!("Could not geocode: {query}");
        return Outcome::Failed;
    }

    for (i, value) in [
        (index.state, location.state),
        (index.zip, location.zip),
        (index.city, location.city),
    ] {
        if let Some(value) = value {
            if row[i].trim().is_empty() {
                row[i] = value;
            }
        }
    }

    let state = row[index.state].trim().to_ascii_uppercase();
    if !(address.contains(',') && address.to_ascii_uppercase().contains(&state)) {
        row[index.address] = format_full_address(
            &address,
            &row[index.city],
            &row[index.state],
            &row[index.zip],
        );
    }

    Outcome::Resolved
}

/// "street, city, STATE ZIP", leaving out blank parts.
pub fn format_full_address(street: &str, city: &str, state: &str, zip: &str) -> String {
    let region = match (state.trim(), zip.trim()) {
        (state, "") => state.to_string(),
        ("", zip) => zip.to_string(),
        (state, zip) => format!("{state} {zip}"),
    };

    let joined = [street.trim(), city.trim(), region.as_str()]
        .into_iter()
        .filter(|x| !x.is_empty())
        .join(", ");
    joined
}
