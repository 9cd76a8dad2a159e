//! StatusRelay - sample producer
//!
//! Submits a timestamped status at a fixed cadence and lets the coalescing
//! reporter forward it to Slack. Any recorded delivery failure is fatal.

use anyhow::Result;
use clap::Parser;
use statusrelay::{cli::Cli, config::Config, CoalescingReporter, ReporterError, SlackClient};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    info!("StatusRelay starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Reporter Interval: {}ms", config.reporter.interval_ms);
    info!("Reporter Slot Policy: {:?}", config.reporter.slot_policy);
    info!("Submit Every: {}ms", config.demo.submit_every_ms);
    if config.demo.run_for_secs > 0 {
        info!("Run For: {}s", config.demo.run_for_secs);
    } else {
        info!("Run For: until Ctrl-C");
    }

    let sink = Arc::new(SlackClient::from_config(&config.slack)?);
    info!("Slack Timeout: {:?}", sink.timeout());
    info!("-------------------------------------------------------");

    let reporter = CoalescingReporter::from_config(sink, &config.reporter);

    let outcome = produce(&reporter, &config).await;

    let snapshot = reporter.stop().await;
    info!(
        attempts = snapshot.attempts,
        deliveries = snapshot.deliveries,
        failures = snapshot.failures,
        "All tasks shut down. Exiting."
    );
    outcome
}

/// Submits a fresh status every `submit_every_ms` until the run time elapses
/// or Ctrl-C is received.
async fn produce(reporter: &CoalescingReporter, config: &Config) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_millis(config.demo.submit_every_ms));
    let deadline = async {
        match config.demo.run_for_secs {
            0 => std::future::pending::<()>().await,
            secs => tokio::time::sleep(Duration::from_secs(secs)).await,
        }
    };
    tokio::pin!(deadline);

    loop {
        if let Some(err) = reporter.last_error() {
            error!("Reporter recorded a delivery error: {}", err);
            return Err(err.into());
        }

        tokio::select! {
            _ = &mut deadline => {
                info!("Run time elapsed. Shutting down...");
                return Ok(());
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Shutdown signal received. Shutting down gracefully...");
                return Ok(());
            }
            _ = ticker.tick() => {
                let message = format!(
                    "{}: {}",
                    config.demo.message_prefix,
                    chrono::Utc::now().to_rfc3339()
                );
                match reporter.submit(message) {
                    Ok(()) => {}
                    Err(ReporterError::SubmissionRejected) => {
                        warn!("Reporter buffer is full, status dropped");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}
