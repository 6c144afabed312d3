use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::models::{DEFAULT_MESSAGE_COUNT, MAX_MESSAGE_COUNT};

/// Structure representing a Slack slash command event.
/// This contains all the fields that Slack sends when a user invokes a slash command.
#[derive(Debug, Deserialize, Serialize)]
pub struct SlackCommandEvent {
    pub token: String,
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
    pub response_url: String,
    pub trigger_id: String,
    pub command_ts: String,
}

/// Decodes a form-urlencoded component; `+` is a space.
///
/// # Errors
///
/// Returns an error message if the decoded bytes are not UTF-8.
pub fn decode_url_component(input: &str) -> Result<String, String> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| format!("Failed to decode URL component: {e}"))
}

/// Parses URL-encoded form data into a `SlackCommandEvent` structure.
///
/// Missing fields are left empty.
///
/// # Errors
///
/// Returns an error message if a key or value cannot be decoded.
pub fn parse_form_data(form_data: &str) -> Result<SlackCommandEvent, String> {
    let mut map: HashMap<String, String> = HashMap::new();

    for pair in form_data.split('&') {
        if let Some((raw_key, raw_value)) = pair.split_once('=') {
            let key = decode_url_component(raw_key)
                .map_err(|e| format!("Failed to decode key: {e}"))?;
            let value = decode_url_component(raw_value)
                .map_err(|e| format!("Failed to decode value: {e}"))?;
            map.insert(key, value);
        }
    }

    let mut field = |name: &str| map.remove(name).unwrap_or_default();

    Ok(SlackCommandEvent {
        token: field("token"),
        team_id: field("team_id"),
        team_domain: field("team_domain"),
        channel_id: field("channel_id"),
        channel_name: field("channel_name"),
        user_id: field("user_id"),
        user_name: field("user_name"),
        command: field("command"),
        text: field("text"),
        response_url: field("response_url"),
        trigger_id: field("trigger_id"),
        command_ts: field("command_ts"),
    })
}

/// What the user asked for in the slash command text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizeCommand {
    /// Summarize the channel; `requested` is the raw count, clamped later.
    Channel { requested: Option<i64> },
    Help,
}

/// Interpret `/summarize [N | help]`.
#[must_use]
pub fn parse_command_text(text: &str) -> SummarizeCommand {
    let mut words = text.split_whitespace();
    match words.next() {
        None => SummarizeCommand::Channel { requested: None },
        Some(word) if word.eq_ignore_ascii_case("help") => SummarizeCommand::Help,
        Some(word) => match word.parse::<i64>() {
            Ok(n) => SummarizeCommand::Channel { requested: Some(n) },
            Err(_) => SummarizeCommand::Help,
        },
    }
}

#[must_use]
pub fn usage_text(command: &str) -> String {
    let command = if command.is_empty() { "/summarize" } else { command };
    format!(
        "*Usage*\n• `{command}` summarizes the latest {DEFAULT_MESSAGE_COUNT} messages in this channel\n\
         • `{command} N` summarizes the latest N messages (up to {MAX_MESSAGE_COUNT})\n\
         • Use the *Summarize thread* message shortcut to summarize a thread"
    )
}
