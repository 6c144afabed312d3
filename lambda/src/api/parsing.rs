use serde_json::Value;

use crate::errors::BotError;
use crate::slack::command_parser::{SlackCommandEvent, decode_url_component, parse_form_data};

pub fn is_interactive_body(body: &str) -> bool {
    body.starts_with("payload=") || body.contains("&payload=")
}

/// Extract and decode the JSON `payload=` field of an interactive request.
///
/// # Errors
///
/// Returns [`BotError::ParseError`] if the field is missing or not JSON.
pub fn parse_interactive_payload(form_body: &str) -> Result<Value, BotError> {
    for pair in form_body.split('&') {
        if let Some(("payload", raw_val)) = pair.split_once('=') {
            let decoded = decode_url_component(raw_val)
                .map_err(|e| BotError::ParseError(format!("Failed to decode payload: {e}")))?;
            return serde_json::from_str(&decoded)
                .map_err(|e| BotError::ParseError(format!("Invalid JSON payload: {e}")));
        }
    }
    Err(BotError::ParseError("Missing payload field".to_string()))
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

/// String at `path`, treating `""` as absent.
pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

pub fn v_array<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    v_path(root, path).and_then(|v| v.as_array())
}

/// # Errors
///
/// Returns [`BotError::ParseError`] if the form body cannot be decoded.
pub fn parse_slack_event(payload: &str) -> Result<SlackCommandEvent, BotError> {
    parse_form_data(payload)
        .map_err(|e| BotError::ParseError(format!("Failed to parse form data: {e}")))
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}
