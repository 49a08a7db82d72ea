use address::{clean_city, five_digit_zip, Location, State};
use serde::Deserialize;
use ureq::Agent;

use crate::utils::agent;

use super::{GeocodeError, GeocoderConfig};

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

pub struct Google {
    agent: Agent,
    api_key: String,
}

impl Google {
    pub fn new(config: &GeocoderConfig, api_key: &str) -> Self {
        Google {
            agent: agent(config),
            api_key: api_key.to_string(),
        }
    }

    pub fn lookup(&self, address: &str) -> Result<Location, GeocodeError> {
        let body = self
            .agent
            .get(GEOCODE_URL)
            .query("address", address)
            .query("key", &self.api_key)
            .call()
            .map_err(Box::new)?
            .into_string()?;

        decode(&body)
    }
}

pub(super) fn decode(body: &str) -> Result<Location, GeocodeError> {
    let response: Response = serde_json::from_str(body)?;
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Location::default()),
        _ => {
            let status = match response.error_message {
                Some(message) => format!("{}: {message}", response.status),
                None => response.status,
            };
            return Err(GeocodeError::Status {
                provider: "google",
                status,
            });
        }
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(Location::default());
    };

    let mut location = Location::default();
    for component in result.address_components {
        if component.is("locality") {
            location.city = clean_city(&component.long_name);
        } else if component.is("administrative_area_level_1") {
            // short_name is already the postal code, keep google's casing
            location.state = component
                .short_name
                .parse::<State>()
                .ok()
                .map(|x| x.code().to_string());
        } else if component.is("postal_code") {
            location.zip = five_digit_zip(&component.long_name);
        }
    }

    Ok(location)
}

#[derive(Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<Component>,
}

#[derive(Deserialize)]
struct Component {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl Component {
    fn is(&self, kind: &str) -> bool {
        self.types.iter().any(|x| x == kind)
    }
}
