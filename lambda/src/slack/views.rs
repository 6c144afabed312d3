//! Block Kit screens shown to the requesting user.
//!
//! Every screen that links back to a draft carries the draft's action token
//! as the button `value`; nothing else is needed to restore it.

use serde_json::{Value, json};

use crate::core::models::{
    ConversationScope, DraftAction, MAX_MESSAGE_COUNT, SummaryDraft, clamp_message_count,
};
use crate::core::token;

/// A rendered Slack message: fallback text plus blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub text: String,
    pub blocks: Value,
}

impl Screen {
    /// A screen that is just one mrkdwn section.
    #[must_use]
    pub fn notice(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            blocks: json!([section(&text)]),
            text,
        }
    }

    /// `action_id`s of every button on the screen.
    #[must_use]
    pub fn action_ids(&self) -> Vec<String> {
        self.buttons()
            .filter_map(|b| b.get("action_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Value of the button with the given action, if present.
    #[must_use]
    pub fn button_value(&self, action: DraftAction) -> Option<&str> {
        self.buttons()
            .find(|b| b.get("action_id").and_then(Value::as_str) == Some(action.action_id()))
            .and_then(|b| b.get("value"))
            .and_then(Value::as_str)
    }

    fn buttons(&self) -> impl Iterator<Item = &Value> {
        self.blocks
            .as_array()
            .into_iter()
            .flatten()
            .filter(|b| b.get("type").and_then(Value::as_str) == Some("actions"))
            .filter_map(|b| b.get("elements").and_then(Value::as_array))
            .flatten()
    }
}

fn section(text: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn button(label: &str, action: DraftAction, value: &str, primary: bool) -> Value {
    let mut b = json!({
        "type": "button",
        "text": { "type": "plain_text", "text": label, "emoji": true },
        "action_id": action.action_id(),
        "value": value,
    });
    if primary {
        b["style"] = Value::String("primary".to_string());
    }
    b
}

fn back_button(value: &str) -> Value {
    button("Back to summary", DraftAction::BackToDraft, value, false)
}

// ============================================================================
// Summary screens
// ============================================================================

/// Shown under a summary that was cut to fit a button value.
pub const SHORTENED_NOTE: &str =
    "_This summary was shortened to fit in a Slack message. Publish, Export and Markdown use the text shown above._";

/// Heading shown above a draft, per scope.
#[must_use]
pub fn draft_heading(scope: &ConversationScope) -> String {
    match scope {
        ConversationScope::Thread { .. } => "📝 *Thread summary is ready*".to_string(),
        ConversationScope::Channel { message_count, .. } => {
            format!("📝 *Channel summary is ready (latest {message_count} messages)*")
        }
    }
}

/// The draft screen: summary text plus Publish, Export and Markdown buttons.
///
/// Tokens are minted from `draft` on every render.
#[must_use]
pub fn draft_screen(draft: &SummaryDraft) -> Screen {
    let value = token::encode(draft);
    let publish_label = match draft.scope {
        ConversationScope::Thread { .. } => "Publish to thread",
        ConversationScope::Channel { .. } => "Publish to channel",
    };

    let heading = draft_heading(&draft.scope);
    let mut blocks = vec![
        section(&format!(
            "{heading}\n\nOnly you can see this summary. You can publish it, export it to Notion or download it as Markdown."
        )),
        section(&draft.summary_text),
    ];
    if draft.is_shortened() {
        blocks.push(json!({
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": SHORTENED_NOTE }]
        }));
    }
    blocks.push(json!({
        "type": "actions",
        "block_id": "summary_actions",
        "elements": [
            button(publish_label, DraftAction::Publish, &value, true),
            button("Export to Notion", DraftAction::Export, &value, false),
            button("Show as Markdown", DraftAction::ShowMarkdown, &value, false),
        ]
    }));

    Screen {
        text: format!("{heading} (only visible to you)").replace('*', ""),
        blocks: Value::Array(blocks),
    }
}

/// Confirmation that replaces the draft once it has been published.
#[must_use]
pub fn published_screen(scope: &ConversationScope) -> Screen {
    let text = match scope {
        ConversationScope::Thread { .. } => "✅ The summary was published to the thread.",
        ConversationScope::Channel { .. } => "✅ The summary was published to the channel.",
    };
    Screen::notice(text)
}

/// Terminal confirmation after a successful Notion export.
#[must_use]
pub fn exported_screen(url: &str) -> Screen {
    Screen::notice(format!("✅ Exported to Notion: <{url}|Open in Notion>"))
}

/// Download link, preview and a way back to the draft.
#[must_use]
pub fn markdown_screen(filename: &str, file_url: &str, preview: &str, back_token: &str) -> Screen {
    let blocks = json!([
        section("📝 *Markdown summary*\n\nThe Markdown file was created. Download it from the link below."),
        section(&format!("<{file_url}|Download {filename}>")),
        section(&format!("Preview:\n```{preview}```")),
        {
            "type": "actions",
            "block_id": "markdown_actions",
            "elements": [back_button(back_token)]
        }
    ]);
    Screen {
        text: format!("📝 Markdown summary: {file_url}"),
        blocks,
    }
}

/// Error screen. With a token, it offers Back to the draft the token encodes.
#[must_use]
pub fn error_screen(message: &str, back_token: Option<&str>) -> Screen {
    let mut blocks = vec![section(message)];
    if let Some(value) = back_token {
        blocks.push(json!({
            "type": "actions",
            "block_id": "error_actions",
            "elements": [back_button(value)]
        }));
    }
    Screen {
        text: message.to_string(),
        blocks: Value::Array(blocks),
    }
}

#[must_use]
pub fn progress_screen(scope: &ConversationScope) -> Screen {
    match scope {
        ConversationScope::Thread { .. } => Screen::notice("📝 Summarizing the thread…"),
        ConversationScope::Channel { message_count, .. } => Screen::notice(format!(
            "📝 Summarizing the latest {message_count} messages…"
        )),
    }
}

// ============================================================================
// Channel picker modal
// ============================================================================

pub const CHANNEL_PICKER_CALLBACK_ID: &str = "channel_select_modal";
const CHANNEL_BLOCK: &str = "channel_select_block";
const CHANNEL_ACTION: &str = "channel_select";
const COUNT_BLOCK: &str = "message_count_block";
const COUNT_ACTION: &str = "message_count";

/// Modal opened by the global shortcut.
#[must_use]
pub fn build_channel_picker_modal() -> Value {
    json!({
        "type": "modal",
        "callback_id": CHANNEL_PICKER_CALLBACK_ID,
        "title": { "type": "plain_text", "text": "Summarize a channel", "emoji": true },
        "submit": { "type": "plain_text", "text": "Summarize", "emoji": true },
        "close": { "type": "plain_text", "text": "Cancel", "emoji": true },
        "blocks": [
            {
                "type": "input",
                "block_id": CHANNEL_BLOCK,
                "label": { "type": "plain_text", "text": "Channel" },
                "element": {
                    "type": "channels_select",
                    "action_id": CHANNEL_ACTION,
                    "placeholder": { "type": "plain_text", "text": "Choose a channel to summarize" }
                }
            },
            {
                "type": "input",
                "block_id": COUNT_BLOCK,
                "optional": true,
                "label": { "type": "plain_text", "text": "How many recent messages?" },
                "element": {
                    "type": "number_input",
                    "is_decimal_allowed": false,
                    "action_id": COUNT_ACTION,
                    "min_value": "1",
                    "max_value": MAX_MESSAGE_COUNT.to_string()
                }
            }
        ]
    })
}

fn state_value<'a>(view: &'a Value, block: &str, action: &str) -> Option<&'a Value> {
    view.get("state")
        .and_then(|s| s.get("values"))
        .and_then(|v| v.get(block))
        .and_then(|b| b.get(action))
}

fn selected_channel(view: &Value) -> Option<&str> {
    state_value(view, CHANNEL_BLOCK, CHANNEL_ACTION)
        .and_then(|a| a.get("selected_channel"))
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
}

fn raw_count(view: &Value) -> Option<&str> {
    state_value(view, COUNT_BLOCK, COUNT_ACTION)
        .and_then(|a| a.get("value"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Validation for the channel picker `view_submission`.
/// Returns a map of `block_id -> error` suitable for Slack's interactive response.
/// # Errors
///
/// Returns a map of field errors when validation fails; otherwise returns `Ok(())`.
pub fn validate_view_submission(view: &Value) -> Result<(), serde_json::Map<String, Value>> {
    let mut errors = serde_json::Map::new();

    if selected_channel(view).is_none() {
        errors.insert(
            CHANNEL_BLOCK.to_string(),
            Value::String("Please choose a channel".to_string()),
        );
    }

    if let Some(n_str) = raw_count(view) {
        if n_str.parse::<i64>().is_err() {
            errors.insert(
                COUNT_BLOCK.to_string(),
                Value::String("Please enter a whole number".to_string()),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Channel scope chosen in a validated channel picker submission.
#[must_use]
pub fn scope_from_submission(view: &Value) -> Option<ConversationScope> {
    let channel_id = selected_channel(view)?.to_string();
    let requested = raw_count(view).and_then(|s| s.parse::<i64>().ok());
    Some(ConversationScope::Channel {
        channel_id,
        message_count: clamp_message_count(requested),
    })
}
