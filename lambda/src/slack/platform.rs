//! The slice of the Slack Web API the bot depends on.
//!
//! Flows talk to Slack only through [`ChatPlatform`] so they can run against
//! an in-memory implementation in tests.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::views::Screen;
use crate::errors::BotError;

/// A Slack message reduced to the fields the fetcher reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConversationMessage {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

impl ConversationMessage {
    /// Message text, if it has any non-empty text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// One page of `conversations.history` or `conversations.replies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub messages: Vec<ConversationMessage>,
    pub next_cursor: Option<String>,
}

/// A text file to upload on behalf of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub filename: String,
    pub title: String,
    pub content: String,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError>;

    /// Newest-first history page of at most `limit` messages.
    async fn channel_history(
        &self,
        channel_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError>;

    /// Real name, falling back to display name.
    async fn user_display_name(&self, user_id: &str) -> Result<String, BotError>;

    async fn channel_name(&self, channel_id: &str) -> Result<String, BotError>;

    /// Workspace subdomain, as in `{domain}.slack.com`.
    async fn team_domain(&self) -> Result<String, BotError>;

    async fn permalink(&self, channel_id: &str, message_ts: &str) -> Result<String, BotError>;

    /// Public message, optionally as a thread reply.
    async fn post_message(
        &self,
        channel_id: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), BotError>;

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        thread_ts: Option<&str>,
        screen: &Screen,
    ) -> Result<(), BotError>;

    /// Post to an interaction `response_url`; the message stays ephemeral.
    async fn respond(
        &self,
        response_url: &str,
        screen: &Screen,
        replace_original: bool,
    ) -> Result<(), BotError>;

    async fn send_dm(&self, user_id: &str, screen: &Screen) -> Result<(), BotError>;

    /// Upload a file to the user's DM and return its permalink.
    async fn upload_text_file(&self, user_id: &str, file: &TextFile) -> Result<String, BotError>;

    async fn open_modal(&self, trigger_id: &str, view: &Value) -> Result<(), BotError>;
}
