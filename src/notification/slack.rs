//! A client for sending status messages to a Slack incoming webhook.

use crate::config::SlackConfig;
use crate::formatting::slack_payload;
use crate::notification::SinkError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{error, info, instrument};

/// A destination that can deliver a single text message.
///
/// Implementations own whatever escaping their transport needs and must not
/// block indefinitely; the reporter awaits each call before its next tick.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Delivers `text`, returning an error for any non-success outcome.
    async fn send(&self, text: &str) -> Result<(), SinkError>;
}

/// A client for posting messages to a Slack webhook.
pub struct SlackClient {
    webhook_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl SlackClient {
    /// Creates a new `SlackClient` whose requests are bounded by `timeout`.
    pub fn new(webhook_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url,
            timeout,
            http,
        })
    }

    pub fn from_config(config: &SlackConfig) -> anyhow::Result<Self> {
        Self::new(
            config.webhook_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Sink for SlackClient {
    /// Escapes `text` and posts it as `{"text": ...}` to the webhook.
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn send(&self, text: &str) -> Result<(), SinkError> {
        let payload = slack_payload(text);

        let response = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to Slack failed");
                if e.is_timeout() {
                    SinkError::Timeout
                } else {
                    SinkError::Transport(e.to_string())
                }
            })?;

        // Slack answers a successful post with exactly 200 OK.
        let status = response.status();
        if status == StatusCode::OK {
            info!("Successfully sent message to Slack.");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            body = %body,
            "Failed to send Slack notification"
        );
        Err(SinkError::Status(status.as_u16()))
    }
}
