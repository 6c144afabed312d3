use serde::{Deserialize, Serialize};

/// Messages summarized when a channel request gives no usable count.
pub const DEFAULT_MESSAGE_COUNT: u32 = 100;

/// Upper bound on messages fetched for a single channel summary.
pub const MAX_MESSAGE_COUNT: u32 = 1000;

/// Clamp a requested channel message count into `1..=MAX_MESSAGE_COUNT`.
///
/// Absent, zero and negative requests fall back to [`DEFAULT_MESSAGE_COUNT`].
#[must_use]
pub fn clamp_message_count(requested: Option<i64>) -> u32 {
    match requested {
        Some(n) if n > i64::from(MAX_MESSAGE_COUNT) => MAX_MESSAGE_COUNT,
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(DEFAULT_MESSAGE_COUNT),
        _ => DEFAULT_MESSAGE_COUNT,
    }
}

/// What a summary covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationScope {
    /// A thread, identified by its root message timestamp.
    Thread { channel_id: String, thread_ts: String },
    /// The most recent `message_count` messages of a channel.
    Channel { channel_id: String, message_count: u32 },
}

impl ConversationScope {
    #[must_use]
    pub fn channel_id(&self) -> &str {
        match self {
            ConversationScope::Thread { channel_id, .. }
            | ConversationScope::Channel { channel_id, .. } => channel_id,
        }
    }

    #[must_use]
    pub fn thread_ts(&self) -> Option<&str> {
        match self {
            ConversationScope::Thread { thread_ts, .. } => Some(thread_ts),
            ConversationScope::Channel { .. } => None,
        }
    }

    #[must_use]
    pub fn message_count(&self) -> Option<u32> {
        match self {
            ConversationScope::Thread { .. } => None,
            ConversationScope::Channel { message_count, .. } => Some(*message_count),
        }
    }

    /// The same scope with its message count clamped into range.
    ///
    /// Scopes arriving over the queue are normalized with this before
    /// anything is fetched or minted into a token.
    #[must_use]
    pub fn clamped(self) -> Self {
        match self {
            ConversationScope::Channel {
                channel_id,
                message_count,
            } => ConversationScope::Channel {
                channel_id,
                message_count: clamp_message_count(Some(i64::from(message_count))),
            },
            thread => thread,
        }
    }
}

/// A generated summary together with the conversation it describes.
///
/// Never stored: it lives in the action token on each button and in the
/// body of the rendered draft screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDraft {
    pub scope: ConversationScope,
    pub summary_text: String,
}

impl SummaryDraft {
    #[must_use]
    pub fn new(scope: ConversationScope, summary_text: impl Into<String>) -> Self {
        Self {
            scope,
            summary_text: summary_text.into(),
        }
    }
}

/// Outcome of a document export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportResult {
    pub success: bool,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl ExportResult {
    #[must_use]
    pub fn ok(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            error: Some(error.into()),
        }
    }
}

/// Interactive buttons offered on summary screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftAction {
    Publish,
    Export,
    ShowMarkdown,
    BackToDraft,
}

impl DraftAction {
    pub const ALL: [DraftAction; 4] = [
        DraftAction::Publish,
        DraftAction::Export,
        DraftAction::ShowMarkdown,
        DraftAction::BackToDraft,
    ];

    /// Slack `action_id` carried by the button.
    #[must_use]
    pub fn action_id(self) -> &'static str {
        match self {
            DraftAction::Publish => "publish_summary",
            DraftAction::Export => "export_summary",
            DraftAction::ShowMarkdown => "show_markdown",
            DraftAction::BackToDraft => "back_to_summary",
        }
    }

    #[must_use]
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.action_id() == action_id)
    }
}

/// Where screens for the requesting user are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub channel_id: Option<String>,
    pub user_id: String,
    pub thread_ts: Option<String>,
    pub response_url: Option<String>,
}

/// Work item handed from the API function to the worker over SQS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionTask {
    /// Fetch and summarize a conversation, then show the draft screen.
    Summarize {
        correlation_id: String,
        user_id: String,
        scope: ConversationScope,
        response_url: Option<String>,
    },
    /// A button click on a summary screen. `value` is the raw action token.
    Action {
        correlation_id: String,
        action: DraftAction,
        value: String,
        target: ReplyTarget,
    },
}

impl InteractionTask {
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        match self {
            InteractionTask::Summarize { correlation_id, .. }
            | InteractionTask::Action { correlation_id, .. } => correlation_id,
        }
    }
}
