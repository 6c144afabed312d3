//! Prompt construction for conversation summaries.

use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use serde_json::{Value, json};

const SYSTEM_PROMPT: &str = "You are an assistant that reads Slack conversations and summarizes them. \
    Write a concise summary in Slack mrkdwn. Cover the main topics, decisions and open questions. \
    Output only the summary.";

fn text_message(role: MessageRole, text: String) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Content::Text(text),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Build the chat prompt for a conversation.
///
/// `message_count` is set for channel summaries and framed in the user turn.
#[must_use]
pub fn build_prompt(conversation: &str, message_count: Option<u32>) -> Vec<ChatCompletionMessage> {
    let instruction = match message_count {
        Some(n) => format!(
            "Below are the latest {n} messages from a Slack channel. Summarize them concisely."
        ),
        None => "Below is a Slack thread. Summarize it concisely.".to_string(),
    };

    vec![
        text_message(MessageRole::system, SYSTEM_PROMPT.to_string()),
        text_message(MessageRole::user, format!("{instruction}\n\n{conversation}")),
    ]
}

const fn role_str(role: &MessageRole) -> &'static str {
    match role {
        MessageRole::system => "system",
        MessageRole::user | MessageRole::function | MessageRole::tool => "user",
        MessageRole::assistant => "assistant",
    }
}

/// Serialize a prompt into the `messages` array of a chat completions request.
///
/// Only text content is sent; image parts are never produced by [`build_prompt`].
pub(crate) fn to_request_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| match &m.content {
            Content::Text(t) => Some(json!({
                "role": role_str(&m.role),
                "content": t,
            })),
            Content::ImageUrl(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_prompt_has_system_then_user() {
        let prompt = build_prompt("alice: hi\n\nbob: hello", None);
        assert_eq!(prompt.len(), 2);
        assert!(matches!(prompt[0].role, MessageRole::system));
        assert!(matches!(prompt[1].role, MessageRole::user));
        let Content::Text(user) = &prompt[1].content else {
            panic!("expected text")
        };
        assert!(user.contains("Slack thread"));
        assert!(user.ends_with("alice: hi\n\nbob: hello"));
    }

    #[test]
    fn channel_prompt_frames_the_count() {
        let prompt = build_prompt("x", Some(42));
        let Content::Text(user) = &prompt[1].content else {
            panic!("expected text")
        };
        assert!(user.contains("latest 42 messages"));
    }

    #[test]
    fn request_messages_use_plain_roles() {
        let messages = to_request_messages(&build_prompt("x", None));
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert!(messages[1]["content"].as_str().unwrap().ends_with('x'));
    }
}
