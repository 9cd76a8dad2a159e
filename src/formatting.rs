// src/formatting.rs

use serde_json::{json, Value};

/// Escapes the characters Slack treats as control sequences in message text.
///
/// Slack only requires `&`, `<` and `>` to be escaped. The input is walked
/// once, so entities produced here are never escaped a second time.
pub fn escape_slack_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builds the JSON body for an incoming-webhook message.
pub fn slack_payload(text: &str) -> Value {
    json!({ "text": escape_slack_text(text) })
}
