//! Handler for Slack interactive components.
//!
//! This module processes interactive payloads including:
//! - `message_action` - the *Summarize thread* message shortcut
//! - `shortcut` - the *Summarize channel* global shortcut
//! - `block_actions` - buttons on summary screens
//! - `view_submission` - the channel picker modal

use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::helpers::{
    notify_with_timeout, ok_empty, ok_ephemeral, ok_modal_clear, ok_modal_errors,
    open_modal_with_timeout,
};
use super::parsing::{v_array, v_str};
use super::sqs;
use super::view_submission;
use crate::core::config::AppConfig;
use crate::core::models::{ConversationScope, DraftAction, InteractionTask, ReplyTarget};
use crate::slack::Screen;
use crate::slack::views::{
    CHANNEL_PICKER_CALLBACK_ID, build_channel_picker_modal, validate_view_submission,
};

pub const THREAD_SHORTCUT_CALLBACK_ID: &str = "summarize_thread";
pub const CHANNEL_SHORTCUT_CALLBACK_ID: &str = "summarize_channel";

const MODAL_OPEN_TIMEOUT_MS: u64 = 2000;
const NOTIFY_TIMEOUT_MS: u64 = 2000;

// ============================================================================
// Task builders
// ============================================================================

/// Thread task for a message shortcut. The thread root is the clicked
/// message's `thread_ts` when it is a reply, else its own `ts`.
#[must_use]
pub fn build_thread_task(payload: &Value, correlation_id: String) -> Option<InteractionTask> {
    let channel_id = v_str(payload, &["channel", "id"])?;
    let user_id = v_str(payload, &["user", "id"])?;
    let thread_ts = v_str(payload, &["message", "thread_ts"])
        .or_else(|| v_str(payload, &["message", "ts"]))?;

    Some(InteractionTask::Summarize {
        correlation_id,
        user_id: user_id.to_string(),
        scope: ConversationScope::Thread {
            channel_id: channel_id.to_string(),
            thread_ts: thread_ts.to_string(),
        },
        response_url: v_str(payload, &["response_url"]).map(str::to_string),
    })
}

/// Action task for the first summary button in a `block_actions` payload.
///
/// The reply target is the clicking user, never anyone named in the token.
#[must_use]
pub fn build_action_task(payload: &Value, correlation_id: String) -> Option<InteractionTask> {
    let (action, value) = v_array(payload, &["actions"])?.iter().find_map(|a| {
        let action = DraftAction::from_action_id(a.get("action_id")?.as_str()?)?;
        let value = a.get("value").and_then(Value::as_str).unwrap_or_default();
        Some((action, value))
    })?;

    let target = ReplyTarget {
        channel_id: v_str(payload, &["channel", "id"])
            .or_else(|| v_str(payload, &["container", "channel_id"]))
            .map(str::to_string),
        user_id: v_str(payload, &["user", "id"])?.to_string(),
        thread_ts: v_str(payload, &["container", "thread_ts"])
            .or_else(|| v_str(payload, &["message", "thread_ts"]))
            .map(str::to_string),
        response_url: v_str(payload, &["response_url"]).map(str::to_string),
    };

    Some(InteractionTask::Action {
        correlation_id,
        action,
        value: value.to_string(),
        target,
    })
}

/// Where and what to tell the user when an action task could not be queued.
///
/// Only button clicks need this; shortcuts and commands answer in the ack.
#[must_use]
pub fn enqueue_failure_notice(
    task: &InteractionTask,
    message: &str,
) -> Option<(ReplyTarget, Screen)> {
    match task {
        InteractionTask::Action { target, .. } => Some((target.clone(), Screen::notice(message))),
        InteractionTask::Summarize { .. } => None,
    }
}

async fn enqueue(config: &AppConfig, task: &InteractionTask) -> Result<(), String> {
    let correlation_id = task.correlation_id();
    sqs::send_to_sqs(task, config).await.map_err(|e| {
        error!("Enqueue failed (correlation_id={}): {}", correlation_id, e);
        format!(
            "Unable to start job (ref: {}). Please try again.",
            &correlation_id[..8.min(correlation_id.len())]
        )
    })
}

// ============================================================================
// Shortcut Handlers
// ============================================================================

async fn handle_message_shortcut(config: &AppConfig, payload: &Value) -> Value {
    let correlation_id = Uuid::new_v4().to_string();
    let Some(task) = build_thread_task(payload, correlation_id.clone()) else {
        warn!("Message shortcut without channel, user or message ts");
        return ok_ephemeral("Could not identify the original message.");
    };

    info!("Thread summary requested, correlation_id={}", correlation_id);
    match enqueue(config, &task).await {
        Ok(()) => ok_empty(),
        Err(message) => ok_ephemeral(&message),
    }
}

/// Open the channel picker. This must happen inline: the `trigger_id`
/// expires long before a queued task could use it.
async fn handle_global_shortcut(config: &AppConfig, payload: &Value) -> Value {
    let Some(trigger_id) = v_str(payload, &["trigger_id"]) else {
        warn!("Global shortcut without trigger_id");
        return ok_empty();
    };

    let view = build_channel_picker_modal();
    open_modal_with_timeout(config, trigger_id, &view, MODAL_OPEN_TIMEOUT_MS).await;

    ok_empty()
}

async fn handle_shortcut(config: &AppConfig, payload: &Value) -> Value {
    let callback_id = v_str(payload, &["callback_id"]).unwrap_or("");
    match callback_id {
        THREAD_SHORTCUT_CALLBACK_ID => handle_message_shortcut(config, payload).await,
        CHANNEL_SHORTCUT_CALLBACK_ID => handle_global_shortcut(config, payload).await,
        _ => {
            info!("Unhandled shortcut: {}", callback_id);
            ok_empty()
        }
    }
}

// ============================================================================
// Block Action Handlers
// ============================================================================

async fn handle_block_actions(config: &AppConfig, payload: &Value) -> Value {
    let correlation_id = Uuid::new_v4().to_string();
    let Some(task) = build_action_task(payload, correlation_id.clone()) else {
        info!("block_actions without a summary action");
        return ok_empty();
    };

    info!("Summary action queued, correlation_id={}", correlation_id);
    // Slack ignores the ack body of a button click.
    if let Err(message) = enqueue(config, &task).await {
        if let Some((target, screen)) = enqueue_failure_notice(&task, &message) {
            notify_with_timeout(config, &target, &screen, NOTIFY_TIMEOUT_MS).await;
        }
    }
    ok_empty()
}

// ============================================================================
// View Submission Handlers
// ============================================================================

async fn handle_channel_picker_submission(
    config: &AppConfig,
    payload: &Value,
    view: &Value,
) -> Value {
    if let Err(errors) = validate_view_submission(view) {
        return ok_modal_errors(&Value::Object(errors));
    }

    let correlation_id = Uuid::new_v4().to_string();
    info!("Channel picker submitted, correlation_id={}", correlation_id);

    let task = match view_submission::build_task_from_view(payload, view, correlation_id.clone()) {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to build task (correlation_id={}): {}", correlation_id, e);
            let message = format!(
                "Error processing request (ref: {}). Please try again.",
                &correlation_id[..8]
            );
            return ok_modal_errors(&json!({ "channel_select_block": message }));
        }
    };

    if let Err(message) = enqueue(config, &task).await {
        return ok_modal_errors(&json!({ "channel_select_block": message }));
    }

    ok_modal_clear()
}

async fn handle_view_submission(config: &AppConfig, payload: &Value) -> Value {
    let Some(view) = payload.get("view") else {
        return json!({
            "statusCode": 400,
            "body": json!({ "error": "Missing view in payload" }).to_string()
        });
    };

    let callback_id = v_str(view, &["callback_id"]).unwrap_or("");
    if callback_id == CHANNEL_PICKER_CALLBACK_ID {
        handle_channel_picker_submission(config, payload, view).await
    } else {
        info!("Unhandled view submission: {}", callback_id);
        ok_modal_clear()
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Handle an interactive payload from Slack.
///
/// # Returns
/// A JSON response value to send back to Slack.
pub async fn handle_interactive(config: &AppConfig, payload: &Value) -> Value {
    let payload_type = v_str(payload, &["type"]).unwrap_or("");

    match payload_type {
        "shortcut" | "message_action" => handle_shortcut(config, payload).await,
        "block_actions" => handle_block_actions(config, payload).await,
        "view_submission" => handle_view_submission(config, payload).await,
        _ => {
            info!("Unhandled interactive type: {}", payload_type);
            ok_empty()
        }
    }
}
