use serde_json::Value;

use super::parsing::v_str;
use crate::core::models::InteractionTask;
use crate::errors::BotError;
use crate::slack::views::scope_from_submission;

/// Build a Summarize task from a validated channel picker submission.
///
/// # Errors
///
/// Returns an error if the submitting user or the selected channel is missing.
pub fn build_task_from_view(
    payload: &Value,
    view: &Value,
    correlation_id: String,
) -> Result<InteractionTask, BotError> {
    let user_id = v_str(payload, &["user", "id"])
        .ok_or_else(|| BotError::ParseError("user.id missing".to_string()))?;
    let scope = scope_from_submission(view)
        .ok_or_else(|| BotError::ParseError("view has no selected channel".to_string()))?;

    // Present only when the modal has a response_url_enabled block.
    let response_url = payload
        .get("response_urls")
        .and_then(Value::as_array)
        .and_then(|urls| urls.first())
        .and_then(|u| v_str(u, &["response_url"]))
        .map(str::to_string);

    Ok(InteractionTask::Summarize {
        correlation_id,
        user_id: user_id.to_string(),
        scope,
        response_url,
    })
}
