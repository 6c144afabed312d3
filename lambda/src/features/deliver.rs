//! Delivery of private screens to the requesting user.
//!
//! Each step falls back to the next: `response_url`, then `chat.postEphemeral`,
//! then a DM. Only the requesting user id carried on the event is ever targeted.

use tracing::{error, info, warn};

use crate::core::models::ReplyTarget;
use crate::errors::BotError;
use crate::slack::{ChatPlatform, Screen};

async fn post_new(
    chat: &dyn ChatPlatform,
    target: &ReplyTarget,
    screen: &Screen,
) -> Result<(), BotError> {
    if let Some(channel_id) = target.channel_id.as_deref() {
        match chat
            .post_ephemeral(channel_id, &target.user_id, target.thread_ts.as_deref(), screen)
            .await
        {
            Ok(()) => return Ok(()),
            Err(e) => warn!(
                "postEphemeral to {} in {} failed, falling back to DM: {}",
                target.user_id, channel_id, e
            ),
        }
    }

    chat.send_dm(&target.user_id, screen).await.map_err(|e| {
        error!("DM fallback failed for user {}: {}", target.user_id, e);
        e
    })
}

/// Show a new private message without touching existing ones.
///
/// # Errors
///
/// Returns the last error when every delivery path failed.
pub async fn show(
    chat: &dyn ChatPlatform,
    target: &ReplyTarget,
    screen: &Screen,
) -> Result<(), BotError> {
    if let Some(url) = target.response_url.as_deref() {
        match chat.respond(url, screen, false).await {
            Ok(()) => return Ok(()),
            Err(e) => warn!("response_url POST failed, posting ephemeral instead: {}", e),
        }
    }
    post_new(chat, target, screen).await
}

/// Replace the private message the user interacted with.
///
/// Falls back to a new message when the original cannot be edited.
///
/// # Errors
///
/// Returns the last error when every delivery path failed.
pub async fn replace(
    chat: &dyn ChatPlatform,
    target: &ReplyTarget,
    screen: &Screen,
) -> Result<(), BotError> {
    if let Some(url) = target.response_url.as_deref() {
        match chat.respond(url, screen, true).await {
            Ok(()) => return Ok(()),
            Err(e) => warn!("Replacing original message failed, posting a new one: {}", e),
        }
    } else {
        info!("No response_url to replace through, posting a new message");
    }
    post_new(chat, target, screen).await
}
