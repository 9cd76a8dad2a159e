//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged on top of
//! the configuration from `statusrelay.toml` and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Relays the latest status to a Slack webhook at a fixed rate.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Slack incoming webhook URL.
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Delivery interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Logging filter, e.g. `debug`.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Stop the sample producer after this many seconds (0 runs until Ctrl-C).
    #[arg(long, value_name = "SECONDS")]
    pub run_for_secs: Option<u64>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(url) = &self.webhook_url {
            let mut slack = Dict::new();
            slack.insert("webhook_url".into(), Value::from(url.clone()));
            dict.insert("slack".into(), Value::from(slack));
        }

        if let Some(interval) = self.interval_ms {
            let mut reporter = Dict::new();
            reporter.insert("interval_ms".into(), Value::from(interval));
            dict.insert("reporter".into(), Value::from(reporter));
        }

        if let Some(secs) = self.run_for_secs {
            let mut demo = Dict::new();
            demo.insert("run_for_secs".into(), Value::from(secs));
            dict.insert("demo".into(), Value::from(demo));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
