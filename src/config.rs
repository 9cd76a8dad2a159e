//! Configuration management for StatusRelay
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, a `statusrelay.toml` file,
//! `STATUSRELAY_` environment variables and command-line flags, in that order.

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::notification::SlotPolicy;

/// The file read when no `--config` flag is given. It is optional.
pub const DEFAULT_CONFIG_PATH: &str = "statusrelay.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging filter for the application, e.g. `info` or `statusrelay=debug`.
    pub log_level: String,
    /// Configuration for the Slack webhook sink.
    pub slack: SlackConfig,
    /// Configuration for the coalescing reporter.
    pub reporter: ReporterConfig,
    /// Configuration for the sample status producer in the binary.
    pub demo: DemoConfig,
}

/// Configuration for the Slack webhook sink.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SlackConfig {
    /// The Slack incoming webhook URL.
    pub webhook_url: String,
    /// Upper bound for a single webhook request, in seconds.
    pub timeout_secs: u64,
}

/// Configuration for the coalescing reporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReporterConfig {
    /// The fixed delivery interval in milliseconds.
    pub interval_ms: u64,
    /// How submissions are handed to the background task.
    #[serde(default)]
    pub slot_policy: SlotPolicy,
}

/// Configuration for the sample producer loop.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DemoConfig {
    /// How often a fresh status is submitted, in milliseconds.
    pub submit_every_ms: u64,
    /// How long the producer runs before shutting down. `0` runs until Ctrl-C.
    pub run_for_secs: u64,
    /// Text prepended to each generated status.
    pub message_prefix: String,
}

impl Config {
    /// Loads the configuration, layering defaults, the TOML file, environment
    /// variables and command-line flags.
    ///
    /// Nested keys are addressed in the environment with a double underscore,
    /// e.g. `STATUSRELAY_SLACK__WEBHOOK_URL`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("STATUSRELAY_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the reporter or sink cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.slack.webhook_url.trim().is_empty() {
            bail!("slack.webhook_url must be set");
        }
        if self.reporter.interval_ms == 0 {
            bail!("reporter.interval_ms must be greater than zero");
        }
        if self.slack.timeout_secs == 0 {
            bail!("slack.timeout_secs must be greater than zero");
        }
        if self.demo.submit_every_ms == 0 {
            bail!("demo.submit_every_ms must be greater than zero");
        }
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            slack: SlackConfig {
                webhook_url: String::new(),
                timeout_secs: 10,
            },
            reporter: ReporterConfig {
                interval_ms: 3000,
                slot_policy: SlotPolicy::Latest,
            },
            demo: DemoConfig {
                submit_every_ms: 1000,
                run_for_secs: 10,
                message_prefix: "[DEBUG] Status relay heartbeat".to_string(),
            },
        }
    }
}
