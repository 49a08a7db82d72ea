use std::{path::PathBuf, time::Duration};

use address::parse_address;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;

use crate::{
    fill::Columns,
    geocode::{GeocoderConfig, Local, Provider, Resolve, Throttle},
    utils::USER_AGENT,
};

mod convert;
mod fill;
mod geocode;
mod utils;

#[derive(Debug, Parser)]
#[command(version, about = "Backfill city, state and ZIP on address data")]
struct Cli {
    #[command(flatten)]
    geocoder: GeocoderArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GeocoderArgs {
    /// Google Geocoding API key. Nominatim is used when unset.
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true, global = true)]
    google_api_key: Option<String>,
    /// Contact email sent along with Nominatim requests
    #[arg(long, env = "NOMINATIM_EMAIL", global = true)]
    nominatim_email: Option<String>,
    /// Request timeout in seconds
    #[arg(long, env = "GEOCODER_TIMEOUT", default_value_t = 10, global = true)]
    timeout: u64,
}

impl GeocoderArgs {
    fn config(self) -> GeocoderConfig {
        GeocoderConfig {
            google_api_key: self.google_api_key,
            email: self.nominatim_email,
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Parse addresses offline and print city, state and ZIP as JSON
    Parse {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Look addresses up with the configured geocoder
    Resolve {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Fill blank state, ZIP and city cells of a CSV export
    Fill {
        input: PathBuf,
        output: PathBuf,
        /// Use the offline parser instead of a geocoding service
        #[arg(long)]
        local: bool,
        #[arg(long, default_value = "Property Address ")]
        address_column: String,
        #[arg(long, default_value = "Property city ")]
        city_column: String,
        #[arg(long, default_value = "state")]
        state_column: String,
        #[arg(long, default_value = "Zip code ")]
        zip_column: String,
    },
    /// Convert a CSV file to a JSON array of objects
    Convert {
        input: PathBuf,
        output: Option<PathBuf>,
        /// Trim whitespace around headers and values
        #[arg(long)]
        trim: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.geocoder.config();

    match cli.command {
        Command::Parse { addresses } => {
            for address in addresses {
                println!("{}", serde_json::to_string(&parse_address(&address))?);
            }
        }
        Command::Resolve { addresses } => {
            let provider = Provider::from_config(&config);
            info!("Using {} for geocoding", provider.name());

            let mut throttle = Throttle::new(provider.min_interval());
            for address in addresses {
                throttle.wait();
                println!("{}", serde_json::to_string(&provider.resolve(&address))?);
            }
        }
        Command::Fill {
            input,
            output,
            local,
            address_column,
            city_column,
            state_column,
            zip_column,
        } => {
            let resolver: Box<dyn Resolve> = if local {
                Box::new(Local)
            } else {
                Box::new(Provider::from_config(&config))
            };
            info!("Using {} for geocoding", resolver.name());

            let columns = Columns {
                address: address_column,
                city: city_column,
                state: state_column,
                zip: zip_column,
            };
            let summary = fill::run(&input, &output, &columns, resolver.as_ref())?;
            info!(
                "Processing complete: {} of {} rows needed data, {} geocoded, {} failed, {} skipped",
                summary.needed, summary.rows, summary.resolved, summary.failed, summary.skipped
            );
            info!("Output file: {}", output.display());
        }
        Command::Convert {
            input,
            output,
            trim,
        } => {
            let count = convert::run(&input, output.as_deref(), trim)?;
            info!("Converted {count} rows");
        }
    }

    Ok(())
}
