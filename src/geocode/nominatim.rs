use std::{collections::BTreeMap, time::Duration};

use address::{clean_city, five_digit_zip, Location, State};
use serde::Deserialize;
use ureq::Agent;

use crate::utils::agent;

use super::{GeocodeError, GeocoderConfig};

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

// https://operations.osmfoundation.org/policies/nominatim/
pub(super) const MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct Nominatim {
    agent: Agent,
    email: Option<String>,
}

impl Nominatim {
    pub fn new(config: &GeocoderConfig) -> Self {
        Nominatim {
            agent: agent(config),
            email: config.email.clone(),
        }
    }

    pub fn lookup(&self, address: &str) -> Result<Location, GeocodeError> {
        let mut request = self
            .agent
            .get(SEARCH_URL)
            .query("q", address)
            .query("format", "json")
            .query("addressdetails", "1")
            .query("limit", "1");
        if let Some(email) = &self.email {
            request = request.query("email", email);
        }

        let body = request.call().map_err(Box::new)?.into_string()?;
        decode(&body)
    }
}

pub(super) fn decode(body: &str) -> Result<Location, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body)?;
    let Some(place) = places.into_iter().next() else {
        return Ok(Location::default());
    };
    let addr = place.address;

    let city = ["city", "town", "village"]
        .iter()
        .find_map(|k| addr.get(*k))
        .and_then(|x| clean_city(x));

    // nominatim gives full names, fall back to the ISO subdivision
    let state = addr
        .get("state")
        .and_then(|x| State::from_name(x))
        .or_else(|| {
            addr.get("ISO3166-2-lvl4")
                .and_then(|x| x.strip_prefix("US-"))
                .and_then(|x| x.parse().ok())
        })
        .map(|x| x.code().to_string());

    Ok(Location {
        city,
        state,
        zip: addr.get("postcode").and_then(|x| five_digit_zip(x)),
    })
}

#[derive(Deserialize)]
struct Place {
    #[serde(default)]
    address: BTreeMap<String, String>,
}
