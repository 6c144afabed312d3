//! Response-related utilities for Slack interactions.
//!
//! Payloads returned in the HTTP acknowledgement of a Slack request.

use serde_json::{Value, json};

/// Create a JSON payload for an ephemeral response
///
/// Ephemeral messages are only visible to the user who triggered the command.
///
/// # Examples
///
/// ```
/// use summary_bot::slack::response_builder::create_ephemeral_payload;
///
/// let payload = create_ephemeral_payload("This message is only visible to you");
/// assert_eq!(payload["response_type"], "ephemeral");
/// ```
#[must_use]
pub fn create_ephemeral_payload(text: &str) -> Value {
    json!({
        "text": text,
        "response_type": "ephemeral"
    })
}

