//! StatusRelay - a rate-limited, coalescing status notifier
//!
//! Producers push status strings as often as they like; the library forwards
//! only the most recent distinct one to a webhook, at most once per interval.

pub mod cli;
pub mod config;
pub mod formatting;
pub mod notification;

pub use notification::{
    CoalescingReporter, ReporterError, ReporterHandle, ReporterSnapshot, ReporterState, Sink,
    SinkError, SlackClient, SlotPolicy,
};
