//! Sends real messages to a Slack webhook. Requires the `live-tests` feature
//! and `STATUSRELAY_SLACK__WEBHOOK_URL` in the environment.

use statusrelay::{CoalescingReporter, Sink, SlackClient};
use std::sync::Arc;
use std::time::Duration;

fn webhook_url() -> String {
    std::env::var("STATUSRELAY_SLACK__WEBHOOK_URL")
        .expect("STATUSRELAY_SLACK__WEBHOOK_URL must be set for live tests")
}

#[tokio::test]
async fn test_live_send_message() {
    let client = SlackClient::new(webhook_url(), Duration::from_secs(10)).unwrap();
    client
        .send("[DEBUG] Running live test <statusrelay> & friends")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_live_reporter() {
    let client = Arc::new(SlackClient::new(webhook_url(), Duration::from_secs(10)).unwrap());
    let reporter = CoalescingReporter::new(client, Duration::from_secs(3));

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(4);
    while tokio::time::Instant::now() < deadline {
        assert_eq!(reporter.last_error(), None);
        ticker.tick().await;
        let message = format!("[DEBUG] Running live test: {}", chrono::Utc::now().to_rfc3339());
        reporter.submit(message).unwrap();
    }

    let snapshot = reporter.stop().await;
    assert_eq!(snapshot.failures, 0);
    assert!(snapshot.deliveries >= 1);
}
