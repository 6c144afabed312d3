//! Handler for the `/summarize` slash command.

use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use super::helpers::{ok_empty, ok_ephemeral};
use super::parsing::parse_slack_event;
use super::sqs;
use crate::core::config::AppConfig;
use crate::core::models::{ConversationScope, InteractionTask, clamp_message_count};
use crate::errors::BotError;
use crate::slack::command_parser::{
    SlackCommandEvent, SummarizeCommand, parse_command_text, usage_text,
};

/// Task for a slash command, or `None` when the user asked for help.
#[must_use]
pub fn build_slash_task(
    event: &SlackCommandEvent,
    correlation_id: String,
) -> Option<InteractionTask> {
    match parse_command_text(&event.text) {
        SummarizeCommand::Help => None,
        SummarizeCommand::Channel { requested } => Some(InteractionTask::Summarize {
            correlation_id,
            user_id: event.user_id.clone(),
            scope: ConversationScope::Channel {
                channel_id: event.channel_id.clone(),
                message_count: clamp_message_count(requested),
            },
            response_url: Some(event.response_url.clone()).filter(|u| !u.is_empty()),
        }),
    }
}

/// Handle a slash command from Slack.
///
/// The worker posts its own progress notice, so a queued command acks empty.
///
/// # Errors
/// Returns an error if the body cannot be parsed.
pub async fn handle_slash_command(config: &AppConfig, body: &str) -> Result<Value, BotError> {
    let slack_event = parse_slack_event(body)?;

    let correlation_id = Uuid::new_v4().to_string();
    let Some(task) = build_slash_task(&slack_event, correlation_id.clone()) else {
        return Ok(ok_ephemeral(&usage_text(&slack_event.command)));
    };

    info!(
        "Slash command for channel {}, correlation_id={}",
        slack_event.channel_id, correlation_id
    );

    if let Err(e) = sqs::send_to_sqs(&task, config).await {
        error!(
            "Failed to enqueue task (correlation_id={}): {}",
            correlation_id, e
        );
        return Ok(ok_ephemeral(&format!(
            "Failed to start summarization. Please try again. (ref: {})",
            &correlation_id[..8]
        )));
    }

    Ok(ok_empty())
}
