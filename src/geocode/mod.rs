use std::{
    thread,
    time::{Duration, Instant},
};

use address::{parse_address, Location};
use log::warn;
use thiserror::Error;

mod google;
mod nominatim;

pub use google::Google;
pub use nominatim::Nominatim;

use crate::utils::USER_AGENT;

pub trait Resolve {
    fn name(&self) -> &'static str;

    fn resolve(&self, address: &str) -> Location;

    /// Enforced by the caller, see [`Throttle`].
    fn min_interval(&self) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(#[from] Box<ureq::Error>),

    #[error("failed to read response: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{provider} returned {status}")]
    Status {
        provider: &'static str,
        status: String,
    },
}

#[derive(Clone, Debug)]
pub struct GeocoderConfig {
    pub google_api_key: Option<String>,
    /// Sent to Nominatim so they can get in touch about heavy usage.
    pub email: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        GeocoderConfig {
            google_api_key: None,
            email: None,
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub enum Provider {
    Google(Google),
    Nominatim(Nominatim),
}

impl Provider {
    pub fn from_config(config: &GeocoderConfig) -> Self {
        match config.google_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Self::Google(Google::new(config, key)),
            _ => Self::Nominatim(Nominatim::new(config)),
        }
    }

    pub fn try_resolve(&self, address: &str) -> Result<Location, GeocodeError> {
        match self {
            Self::Google(x) => x.lookup(address),
            Self::Nominatim(x) => x.lookup(address),
        }
    }
}

impl Resolve for Provider {
    fn name(&self) -> &'static str {
        match self {
            Self::Google(_) => "Google Maps",
            Self::Nominatim(_) => "OpenStreetMap Nominatim",
        }
    }

    fn resolve(&self, address: &str) -> Location {
        settle(self.name(), address, self.try_resolve(address))
    }

    fn min_interval(&self) -> Option<Duration> {
        match self {
            Self::Google(_) => None,
            Self::Nominatim(_) => Some(nominatim::MIN_INTERVAL),
        }
    }
}

fn settle(provider: &str, address: &str, result: Result<Location, GeocodeError>) -> Location {
    match result {
        Ok(x) => x,
        Err(e) => {
            warn!("{provider} geocoding error for {address}: {e}");
            Location::default()
        }
    }
}

/// Offline resolution with the regex parser.
pub struct Local;

impl Resolve for Local {
    fn name(&self) -> &'static str {
        "local parser"
    }

    fn resolve(&self, address: &str) -> Location {
        parse_address(address)
    }
}

pub struct Throttle {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Option<Duration>) -> Self {
        Throttle {
            interval,
            last: None,
        }
    }

    pub fn wait(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_selection() {
        let mut config = GeocoderConfig::default();
        assert!(matches!(
            Provider::from_config(&config),
            Provider::Nominatim(_)
        ));

        config.google_api_key = Some("  ".to_string());
        assert!(matches!(
            Provider::from_config(&config),
            Provider::Nominatim(_)
        ));

        config.google_api_key = Some("key".to_string());
        let provider = Provider::from_config(&config);
        assert!(matches!(provider, Provider::Google(_)));
        assert_eq!(provider.min_interval(), None);
    }

    #[test]
    fn nominatim_is_throttled() {
        let provider = Provider::from_config(&GeocoderConfig::default());
        assert_eq!(provider.min_interval(), Some(Duration::from_secs(1)));
        assert_eq!(Local.min_interval(), None);
    }

    #[test]
    fn errors_settle_to_empty() {
        let result = google::decode("<html>Service Unavailable</html>");
        assert!(result.is_err());
        assert!(settle("Google Maps", "1 Main St", result).is_empty());

        let result = nominatim::decode("");
        assert!(result.is_err());
        assert!(settle("OpenStreetMap Nominatim", "1 Main St", result).is_empty());
    }

    #[test]
    fn local_resolver() {
        assert_eq!(
            Local.resolve("123 Main St, Dallas, TX 75201").state.as_deref(),
            Some("tx")
        );
    }

    #[test]
    fn throttle_spaces_calls() {
        let mut throttle = Throttle::new(Some(Duration::from_millis(50)));
        let start = Instant::now();
        throttle.wait();
        throttle.wait();
        throttle.wait();
        assert!(start.elapsed() >= Duration::from_millis(100));

        let mut throttle = Throttle::new(None);
        let start = Instant::now();
        throttle.wait();
        throttle.wait();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
