use indicatif::{ProgressBar, ProgressStyle};
use ureq::{Agent, AgentBuilder};

use crate::geocode::GeocoderConfig;

pub const USER_AGENT: &str = concat!("backfill/", env!("CARGO_PKG_VERSION"));

pub fn progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template("[{elapsed_precise}] {human_pos}/{human_len} {percent}% ({per_sec})")
            .expect("hardcoded"),
    )
}

pub fn agent(config: &GeocoderConfig) -> Agent {
    AgentBuilder::new()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .build()
}
