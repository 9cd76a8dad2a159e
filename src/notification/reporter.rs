//! The `CoalescingReporter` is a small actor that decouples how often
//! producers publish a status from how often the status is delivered.
//!
//! Producers submit strings without ever blocking. A single background task
//! tracks the most recent value and, on a fixed timer, forwards it to a
//! [`Sink`] if it has changed since the last successful delivery. Delivery
//! failures never reach producers; they are recorded and exposed through
//! [`CoalescingReporter::last_error`].

use crate::config::ReporterConfig;
use crate::notification::{ReporterError, Sink};
use arc_swap::{ArcSwap, ArcSwapOption};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// How a submission is handed to the background task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SlotPolicy {
    /// A single slot that every submission overwrites. Submissions are never
    /// rejected and the task always observes the newest value.
    #[default]
    Latest,
    /// A queue of capacity one. A submission made while the previous one is
    /// still unconsumed is dropped with [`ReporterError::SubmissionRejected`].
    RejectWhenFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReporterState {
    /// Nothing is waiting to be delivered.
    Idle,
    /// The tracked value differs from the last delivered one.
    Dirty,
    Stopped,
}

/// A point-in-time view of the background task's state.
///
/// Published after every transition; reads may lag an in-flight delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReporterSnapshot {
    pub state: ReporterState,
    /// The most recent distinct value the task has observed.
    pub tracked: Option<String>,
    /// The last value the sink accepted.
    pub last_sent: Option<String>,
    pub attempts: u64,
    pub deliveries: u64,
    pub failures: u64,
}

impl Default for ReporterSnapshot {
    fn default() -> Self {
        Self {
            state: ReporterState::Idle,
            tracked: None,
            last_sent: None,
            attempts: 0,
            deliveries: 0,
            failures: 0,
        }
    }
}

#[derive(Clone)]
enum Outbox {
    Latest(Arc<watch::Sender<Option<String>>>),
    Queued(mpsc::Sender<String>),
}

enum Inbox {
    Latest(watch::Receiver<Option<String>>),
    Queued(mpsc::Receiver<String>),
}

fn slot(policy: SlotPolicy) -> (Outbox, Inbox) {
    match policy {
        SlotPolicy::Latest => {
            let (tx, rx) = watch::channel(None);
            (Outbox::Latest(Arc::new(tx)), Inbox::Latest(rx))
        }
        SlotPolicy::RejectWhenFull => {
            let (tx, rx) = mpsc::channel(1);
            (Outbox::Queued(tx), Inbox::Queued(rx))
        }
    }
}

impl Outbox {
    fn submit(&self, value: String) -> Result<(), ReporterError> {
        match self {
            Outbox::Latest(tx) => {
                if tx.is_closed() {
                    return Err(ReporterError::Stopped);
                }
                tx.send_replace(Some(value));
                Ok(())
            }
            Outbox::Queued(tx) => tx.try_send(value).map_err(|e| match e {
                TrySendError::Full(_) => ReporterError::SubmissionRejected,
                TrySendError::Closed(_) => ReporterError::Stopped,
            }),
        }
    }
}

impl Inbox {
    /// Waits for the next submission. `None` once every producer is gone.
    async fn recv(&mut self) -> Option<String> {
        match self {
            Inbox::Latest(rx) => loop {
                rx.changed().await.ok()?;
                let latest = rx.borrow_and_update().clone();
                if let Some(value) = latest {
                    return Some(value);
                }
            },
            Inbox::Queued(rx) => rx.recv().await,
        }
    }
}

/// State shared between the reporter's owner and its background task.
struct Shared {
    last_error: ArcSwapOption<ReporterError>,
    snapshot: ArcSwap<ReporterSnapshot>,
}

/// A cloneable, non-blocking submission handle for a [`CoalescingReporter`].
#[derive(Clone)]
pub struct ReporterHandle {
    outbox: Outbox,
}

impl ReporterHandle {
    /// Offers `value` as the newest status. Never blocks.
    ///
    /// Returns [`ReporterError::SubmissionRejected`] when the slot is full
    /// (only under [`SlotPolicy::RejectWhenFull`]) and
    /// [`ReporterError::Stopped`] once the reporter has stopped.
    pub fn submit(&self, value: impl Into<String>) -> Result<(), ReporterError> {
        self.outbox.submit(value.into())
    }
}

/// Forwards the latest distinct status to a [`Sink`] at most once per
/// interval.
pub struct CoalescingReporter {
    handle: ReporterHandle,
    shared: Arc<Shared>,
    interval: Duration,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CoalescingReporter {
    /// Creates a reporter using [`SlotPolicy::Latest`] and starts its
    /// background task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    /// Panics if `interval` is zero.
    pub fn new<S>(sink: Arc<S>, interval: Duration) -> Self
    where
        S: Sink + ?Sized + 'static,
    {
        Self::with_policy(sink, interval, SlotPolicy::default())
    }

    pub fn from_config<S>(sink: Arc<S>, config: &ReporterConfig) -> Self
    where
        S: Sink + ?Sized + 'static,
    {
        Self::with_policy(
            sink,
            Duration::from_millis(config.interval_ms),
            config.slot_policy,
        )
    }

    pub fn with_policy<S>(sink: Arc<S>, interval: Duration, policy: SlotPolicy) -> Self
    where
        S: Sink + ?Sized + 'static,
    {
        let (outbox, inbox) = slot(policy);
        let (stop_tx, stop_rx) = oneshot::channel();
        let shared = Arc::new(Shared {
            last_error: ArcSwapOption::empty(),
            snapshot: ArcSwap::from_pointee(ReporterSnapshot::default()),
        });

        // The first tick is one full interval away: delivery is only ever
        // driven by the timer, never by a submission.
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let core = ReporterCore {
            sink,
            shared: shared.clone(),
            state: ReporterSnapshot::default(),
        };
        info!(?interval, ?policy, "Reporter started.");
        let task = tokio::spawn(core.run(ticker, inbox, stop_rx));

        Self {
            handle: ReporterHandle { outbox },
            shared,
            interval,
            stop_tx,
            task,
        }
    }

    /// See [`ReporterHandle::submit`].
    pub fn submit(&self, value: impl Into<String>) -> Result<(), ReporterError> {
        self.handle.submit(value)
    }

    /// Returns a handle producers can clone and submit through.
    pub fn handle(&self) -> ReporterHandle {
        self.handle.clone()
    }

    /// The most recent delivery failure, if any.
    ///
    /// A successful delivery does not clear it; use
    /// [`clear_last_error`](Self::clear_last_error) for that.
    pub fn last_error(&self) -> Option<ReporterError> {
        self.shared
            .last_error
            .load_full()
            .map(|e| e.as_ref().clone())
    }

    pub fn clear_last_error(&self) {
        self.shared.last_error.store(None);
    }

    pub fn snapshot(&self) -> ReporterSnapshot {
        self.shared.snapshot.load_full().as_ref().clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the timer and waits for the background task to exit.
    ///
    /// A delivery already in progress is allowed to finish. Handles obtained
    /// from [`handle`](Self::handle) reject submissions from then on.
    pub async fn stop(self) -> ReporterSnapshot {
        let Self {
            shared,
            stop_tx,
            task,
            ..
        } = self;

        // The task may already be gone if every producer was dropped.
        let _ = stop_tx.send(());
        if let Err(e) = task.await {
            error!("Reporter task panicked: {:?}", e);
            shared.snapshot.rcu(|current| ReporterSnapshot {
                state: ReporterState::Stopped,
                ..current.as_ref().clone()
            });
        }

        info!("Reporter stopped.");
        shared.snapshot.load_full().as_ref().clone()
    }
}

/// The state owned exclusively by the background task.
struct ReporterCore<S: ?Sized> {
    sink: Arc<S>,
    shared: Arc<Shared>,
    state: ReporterSnapshot,
}

impl<S: Sink + ?Sized> ReporterCore<S> {
    async fn run(
        mut self,
        mut ticker: Interval,
        mut inbox: Inbox,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    debug!("Reporter received stop signal.");
                    break;
                }
                _ = ticker.tick() => {
                    self.on_tick().await;
                }
                value = inbox.recv() => match value {
                    Some(value) => self.on_submit(value),
                    None => {
                        debug!("All reporter handles dropped.");
                        break;
                    }
                }
            }
        }

        self.state.state = ReporterState::Stopped;
        self.publish();
    }

    fn on_submit(&mut self, value: String) {
        if self.state.tracked.as_deref() == Some(value.as_str()) {
            return;
        }

        // Dirty means "differs from what the sink last accepted", so going
        // back to the delivered value while a send is pending clears it.
        let dirty = self.state.last_sent.as_deref() != Some(value.as_str());
        debug!(dirty, "Tracking new status value");
        self.state.tracked = Some(value);
        self.state.state = if dirty {
            ReporterState::Dirty
        } else {
            ReporterState::Idle
        };
        self.publish();
    }

    async fn on_tick(&mut self) {
        if self.state.state != ReporterState::Dirty {
            return;
        }
        let Some(text) = self.state.tracked.clone() else {
            return;
        };

        self.state.attempts += 1;
        match self.sink.send(&text).await {
            Ok(()) => {
                info!(attempt = self.state.attempts, "Delivered status update.");
                self.state.deliveries += 1;
                self.state.last_sent = Some(text);
                self.state.state = ReporterState::Idle;
            }
            Err(e) => {
                warn!(error = %e, "Could not send status, will retry on next tick");
                self.state.failures += 1;
                self.shared
                    .last_error
                    .store(Some(Arc::new(ReporterError::DeliveryFailed(e))));
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.shared.snapshot.store(Arc::new(self.state.clone()));
    }
}
