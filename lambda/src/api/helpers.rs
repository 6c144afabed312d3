//! Response builders and the inline modal open shared by API handlers.

use serde_json::{Value, json};
use std::time::Duration;
use tracing::error;

use crate::core::config::AppConfig;
use crate::core::models::ReplyTarget;
use crate::features::deliver;
use crate::slack::{ChatPlatform, Screen, SlackClient};

// ============================================================================
// Response Builders
// ============================================================================

/// Returns a 200 OK response with an empty JSON body.
#[must_use]
pub fn ok_empty() -> Value {
    json!({ "statusCode": 200, "body": "{}" })
}

/// Returns a 200 OK response with an ephemeral Slack message.
#[must_use]
pub fn ok_ephemeral(text: &str) -> Value {
    json!({
        "statusCode": 200,
        "body": crate::slack::response_builder::create_ephemeral_payload(text).to_string()
    })
}

/// Returns a 200 OK response that closes the modal.
#[must_use]
pub fn ok_modal_clear() -> Value {
    json!({
        "statusCode": 200,
        "body": json!({ "response_action": "clear" }).to_string()
    })
}

/// Returns a 200 OK response with modal validation errors.
#[must_use]
pub fn ok_modal_errors(errors: &Value) -> Value {
    json!({
        "statusCode": 200,
        "body": json!({ "response_action": "errors", "errors": errors }).to_string()
    })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "body": json!({ "error": message }).to_string()
    })
}

// ============================================================================
// Modal Operations
// ============================================================================

/// Opens a modal, waiting at most `timeout_ms` so the Slack ack stays fast.
///
/// The `trigger_id` expires after three seconds, so this cannot be deferred
/// to the worker. If the timeout fires, the open continues in the background.
pub async fn open_modal_with_timeout(
    config: &AppConfig,
    trigger_id: &str,
    view: &Value,
    timeout_ms: u64,
) {
    let client = SlackClient::new(config.slack_bot_token.clone());
    let trigger_id = trigger_id.to_string();
    let view = view.clone();

    let modal_handle = tokio::spawn(async move {
        if let Err(e) = client.open_modal(&trigger_id, &view).await {
            error!("Failed to open modal: {}", e);
        }
    });

    let _ = tokio::time::timeout(Duration::from_millis(timeout_ms), modal_handle).await;
}

/// Shows `screen` to the requesting user, waiting at most `timeout_ms`.
///
/// Used where the ack body is ignored by Slack, such as button clicks.
pub async fn notify_with_timeout(
    config: &AppConfig,
    target: &ReplyTarget,
    screen: &Screen,
    timeout_ms: u64,
) {
    let client = SlackClient::new(config.slack_bot_token.clone());
    let target = target.clone();
    let screen = screen.clone();

    let notify_handle = tokio::spawn(async move {
        if let Err(e) = deliver::show(&client, &target, &screen).await {
            error!("Failed to notify user {}: {}", target.user_id, e);
        }
    });

    let _ = tokio::time::timeout(Duration::from_millis(timeout_ms), notify_handle).await;
}
