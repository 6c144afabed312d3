//! Text for the public post and the Notion page title.

use tracing::warn;

use super::fetch::{excerpt, thread_root_text};
use crate::core::models::ConversationScope;
use crate::slack::ChatPlatform;

const TITLE_TOPIC_CHARS: usize = 30;

/// Message posted when a draft is published.
#[must_use]
pub fn publish_text(scope: &ConversationScope, summary: &str) -> String {
    match scope {
        ConversationScope::Thread { .. } => format!("📝 *Thread summary*\n\n{summary}"),
        ConversationScope::Channel { message_count, .. } => {
            format!("📝 *Channel summary (latest {message_count} messages)*\n\n{summary}")
        }
    }
}

/// Document title for a thread, from its channel and root message.
#[must_use]
pub fn thread_title(channel_name: &str, root_text: &str) -> String {
    format!(
        "{channel_name} thread summary: {}",
        excerpt(root_text, TITLE_TOPIC_CHARS, "…")
    )
}

#[must_use]
pub fn channel_title(channel_name: &str, message_count: u32) -> String {
    format!("{channel_name} channel summary (latest {message_count} messages)")
}

/// Build the export title. Lookups that fail degrade to the channel id and
/// an empty topic; a title is never a reason to refuse an export.
pub async fn export_title(chat: &dyn ChatPlatform, scope: &ConversationScope) -> String {
    let channel_name = match chat.channel_name(scope.channel_id()).await {
        Ok(name) => name,
        Err(e) => {
            warn!("Failed to get channel name for {}: {}", scope.channel_id(), e);
            scope.channel_id().to_string()
        }
    };

    match scope {
        ConversationScope::Thread {
            channel_id,
            thread_ts,
        } => {
            let root = thread_root_text(chat, channel_id, thread_ts)
                .await
                .unwrap_or_else(|e| {
                    warn!("Failed to get thread root for {}: {}", thread_ts, e);
                    String::new()
                });
            thread_title(&channel_name, &root)
        }
        ConversationScope::Channel { message_count, .. } => {
            channel_title(&channel_name, *message_count)
        }
    }
}
