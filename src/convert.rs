use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
};

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use serde_json::{Map, Value};

/// Converts a headered CSV file into a JSON array of objects. Writes to stdout
/// when no output path is given.
pub fn run(input: &Path, output: Option<&Path>, trim: bool) -> Result<usize> {
    let reader = ReaderBuilder::new()
        .trim(if trim { Trim::All } else { Trim::None })
        .from_path(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let rows = to_json(reader)?;

    let mut text = serde_json::to_string_pretty(&rows)?;
    text.push('\n');
    match output {
        Some(path) => fs::write(path, &text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout().write_all(text.as_bytes())?,
    }

    Ok(rows.len())
}

pub fn to_json<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Map<String, Value>>> {
    let headers = reader.headers()?.clone();
    if let Some(x) = headers.iter().duplicates().next() {
        bail!("Duplicate column {x:?}");
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        );
    }
    Ok(rows)
}
