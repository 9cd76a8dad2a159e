//! Rate-limited delivery of status text to a notification endpoint.
//!
//! Producers hand status strings to a [`CoalescingReporter`], which keeps only
//! the most recent one and forwards it to a [`Sink`] at most once per
//! interval, and only when it differs from what was last delivered.
pub mod reporter;
pub mod slack;

use thiserror::Error;

pub use reporter::{CoalescingReporter, ReporterHandle, ReporterSnapshot, ReporterState, SlotPolicy};
pub use slack::{Sink, SlackClient};

/// A failure reported by a [`Sink`] while delivering a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("webhook returned HTTP status {0}")]
    Status(u16),

    #[error("webhook request timed out")]
    Timeout,

    #[error("webhook request failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReporterError {
    /// The pending slot still holds a value the background task has not
    /// consumed. The submitted value was dropped.
    #[error("reporter buffer is full, status dropped")]
    SubmissionRejected,

    #[error("reporter has been stopped")]
    Stopped,

    #[error("could not deliver status: {0}")]
    DeliveryFailed(#[from] SinkError),
}
