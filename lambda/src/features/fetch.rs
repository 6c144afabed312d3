//! Conversation fetching and flattening.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::core::models::{ConversationScope, clamp_message_count};
use crate::errors::BotError;
use crate::slack::{ChatPlatform, ConversationMessage};

/// Shown in place of an author whose name cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown user";

/// Largest page requested from `conversations.history`.
const HISTORY_PAGE_SIZE: u32 = 200;

const MESSAGE_SEPARATOR: &str = "\n\n";

/// Channel messages worth summarizing: human posts and bot posts.
fn is_eligible_channel_message(msg: &ConversationMessage) -> bool {
    msg.text().is_some() && matches!(msg.subtype.as_deref(), None | Some("bot_message"))
}

/// Fetch the conversation and flatten it into one paragraph per message.
///
/// # Errors
///
/// Returns [`BotError::EmptyConversation`] when nothing is eligible, or the
/// underlying Slack error when a history page cannot be fetched.
pub async fn fetch_conversation(
    chat: &dyn ChatPlatform,
    scope: &ConversationScope,
) -> Result<String, BotError> {
    let paragraphs = match scope {
        ConversationScope::Thread {
            channel_id,
            thread_ts,
        } => fetch_thread(chat, channel_id, thread_ts).await?,
        ConversationScope::Channel {
            channel_id,
            message_count,
        } => fetch_channel(chat, channel_id, *message_count).await?,
    };

    if paragraphs.is_empty() {
        return Err(BotError::EmptyConversation);
    }
    debug!("Flattened {} messages", paragraphs.len());
    Ok(paragraphs.join(MESSAGE_SEPARATOR))
}

async fn fetch_thread(
    chat: &dyn ChatPlatform,
    channel_id: &str,
    thread_ts: &str,
) -> Result<Vec<String>, BotError> {
    let mut paragraphs = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = chat
            .thread_replies(channel_id, thread_ts, cursor.as_deref())
            .await?;
        paragraphs.extend(
            page.messages
                .iter()
                .filter_map(ConversationMessage::text)
                .map(str::to_string),
        );
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(paragraphs)
}

async fn fetch_channel(
    chat: &dyn ChatPlatform,
    channel_id: &str,
    message_count: u32,
) -> Result<Vec<String>, BotError> {
    let limit = clamp_message_count(Some(i64::from(message_count))) as usize;
    let mut newest_first: Vec<ConversationMessage> = Vec::with_capacity(limit);
    let mut cursor: Option<String> = None;

    while newest_first.len() < limit {
        let remaining = u32::try_from(limit - newest_first.len()).unwrap_or(HISTORY_PAGE_SIZE);
        let page = chat
            .channel_history(channel_id, remaining.min(HISTORY_PAGE_SIZE), cursor.as_deref())
            .await?;
        newest_first.extend(page.messages);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    newest_first.truncate(limit);

    let mut messages: Vec<ConversationMessage> = newest_first
        .into_iter()
        .filter(is_eligible_channel_message)
        .collect();
    messages.reverse();

    let names = resolve_authors(chat, &messages).await;

    Ok(messages
        .iter()
        .filter_map(|msg| {
            let text = msg.text()?;
            let author = match (&msg.user, &msg.username) {
                (Some(uid), _) => names.get(uid).map_or(UNKNOWN_USER, String::as_str),
                (None, Some(username)) if !username.is_empty() => username.as_str(),
                _ => UNKNOWN_USER,
            };
            Some(format!("{author}: {text}"))
        })
        .collect())
}

/// Look up each distinct author once. Failed lookups map to [`UNKNOWN_USER`].
async fn resolve_authors(
    chat: &dyn ChatPlatform,
    messages: &[ConversationMessage],
) -> HashMap<String, String> {
    let user_ids: HashSet<&str> = messages.iter().filter_map(|m| m.user.as_deref()).collect();

    let fetches = user_ids
        .into_iter()
        .map(|uid| async move { (uid, chat.user_display_name(uid).await) });

    let mut cache = HashMap::new();
    for (uid, res) in join_all(fetches).await {
        let name = res.unwrap_or_else(|e| {
            warn!("Failed to get user info for {}: {}", uid, e);
            UNKNOWN_USER.to_string()
        });
        cache.insert(uid.to_string(), name);
    }
    cache
}

/// Text of a thread's root message, or empty when it has none.
///
/// # Errors
///
/// Returns the Slack error when the replies cannot be fetched.
pub async fn thread_root_text(
    chat: &dyn ChatPlatform,
    channel_id: &str,
    thread_ts: &str,
) -> Result<String, BotError> {
    let page = chat.thread_replies(channel_id, thread_ts, None).await?;
    Ok(page
        .messages
        .first()
        .and_then(ConversationMessage::text)
        .unwrap_or_default()
        .to_string())
}

/// First `max_chars` characters, with `…` appended when cut.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize, ellipsis: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}{ellipsis}")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(subtype: Option<&str>, text: &str) -> ConversationMessage {
        ConversationMessage {
            user: Some("U1".into()),
            subtype: subtype.map(str::to_string),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    #[test]
    fn eligibility_keeps_plain_and_bot_messages() {
        assert!(is_eligible_channel_message(&msg(None, "hi")));
        assert!(is_eligible_channel_message(&msg(Some("bot_message"), "hi")));
        assert!(!is_eligible_channel_message(&msg(Some("channel_join"), "hi")));
        assert!(!is_eligible_channel_message(&msg(None, "")));
    }

    #[test]
    fn excerpt_only_marks_cut_text() {
        assert_eq!(excerpt("short", 10, "..."), "short");
        assert_eq!(excerpt("exactly10!", 10, "..."), "exactly10!");
        assert_eq!(excerpt("a longer sentence", 8, "..."), "a longer...");
        assert_eq!(excerpt("日本語テキスト", 3, "…"), "日本語…");
    }
}
