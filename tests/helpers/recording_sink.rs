//! A recording sink for exercising the reporter through its public API.

use async_trait::async_trait;
use statusrelay::{Sink, SinkError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<String>>>,
    scripted: Arc<Mutex<VecDeque<Result<(), SinkError>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues outcomes for the next calls; once exhausted every call succeeds.
    pub fn with_outcomes(outcomes: Vec<Result<(), SinkError>>) -> Self {
        Self {
            sent: Arc::default(),
            scripted: Arc::new(Mutex::new(outcomes.into())),
        }
    }

    pub fn get_sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push(text.to_string());
        self.scripted.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
