//! Action token codec.
//!
//! Every button on a summary screen carries the whole draft as its `value`:
//!
//! - thread scope: `channelId:threadTs:encodedSummary`
//! - channel scope: `channelId:channel:messageCount:encodedSummary`
//!
//! Only the summary is percent-encoded, and only the last segment is ever
//! treated as the summary. Channel ids and timestamps never contain `:`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use super::models::{ConversationScope, MAX_MESSAGE_COUNT, SummaryDraft};
use crate::errors::BotError;

pub const DELIMITER: char = ':';

/// Second segment marking a channel-scope token.
pub const CHANNEL_MARKER: &str = "channel";

/// Slack rejects button values longer than this.
pub const MAX_ACTION_VALUE_LEN: usize = 2000;

/// Appended to a summary shortened to fit [`MAX_ACTION_VALUE_LEN`].
const ELLIPSIS: char = '…';

/// Characters left unescaped, matching `encodeURIComponent`.
const SUMMARY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_summary(summary: &str) -> String {
    utf8_percent_encode(summary, SUMMARY_ESCAPE).to_string()
}

/// Longest encoding of one `char`: four UTF-8 bytes, three per escape.
const MAX_ENCODED_CHAR_LEN: usize = 12;

fn encoded_char_len(c: char) -> usize {
    let mut buf = [0u8; 4];
    utf8_percent_encode(c.encode_utf8(&mut buf), SUMMARY_ESCAPE)
        .map(str::len)
        .sum()
}

fn scope_prefix(scope: &ConversationScope) -> String {
    match scope {
        ConversationScope::Thread {
            channel_id,
            thread_ts,
        } => format!("{channel_id}{DELIMITER}{thread_ts}{DELIMITER}"),
        ConversationScope::Channel {
            channel_id,
            message_count,
        } => format!(
            "{channel_id}{DELIMITER}{CHANNEL_MARKER}{DELIMITER}{message_count}{DELIMITER}"
        ),
    }
}

/// Serialize a draft into the value carried on a button.
#[must_use]
pub fn encode(draft: &SummaryDraft) -> String {
    let mut token = scope_prefix(&draft.scope);
    token.push_str(&encode_summary(&draft.summary_text));
    token
}

/// `%` must always start a two-digit hex escape; `percent_decode_str` would
/// otherwise pass a stray `%` through silently.
fn validate_escapes(encoded: &str) -> Result<(), BotError> {
    let bytes = encoded.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(BotError::MalformedToken(format!(
                    "invalid percent escape at byte {i}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn decode_summary(encoded: &str) -> Result<String, BotError> {
    validate_escapes(encoded)?;
    let summary = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|e| BotError::MalformedToken(format!("summary is not UTF-8: {e}")))?
        .into_owned();
    if summary.is_empty() {
        return Err(BotError::MalformedToken("empty summary".to_string()));
    }
    Ok(summary)
}

fn non_empty<'a>(segment: &'a str, what: &str) -> Result<&'a str, BotError> {
    if segment.is_empty() {
        Err(BotError::MalformedToken(format!("empty {what}")))
    } else {
        Ok(segment)
    }
}

/// Recover the draft carried by a button value.
///
/// # Errors
///
/// Returns [`BotError::MalformedToken`] when the token has fewer than three
/// fields, the scope descriptor has the wrong shape, the message count is not
/// a positive integer within range, or the summary cannot be percent-decoded.
pub fn decode(token: &str) -> Result<SummaryDraft, BotError> {
    let mut parts: Vec<&str> = token.split(DELIMITER).collect();
    if parts.len() < 3 {
        return Err(BotError::MalformedToken(format!(
            "expected at least 3 fields, found {}",
            parts.len()
        )));
    }

    let encoded_summary = parts.pop().unwrap_or_default();

    let scope = if parts[1] == CHANNEL_MARKER {
        let [channel_id, _, count] = parts[..] else {
            return Err(BotError::MalformedToken(format!(
                "channel token needs 4 fields, found {}",
                parts.len() + 1
            )));
        };
        let message_count = count
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_MESSAGE_COUNT).contains(n))
            .ok_or_else(|| BotError::MalformedToken(format!("invalid message count {count:?}")))?;
        ConversationScope::Channel {
            channel_id: non_empty(channel_id, "channel id")?.to_string(),
            message_count,
        }
    } else {
        let [channel_id, thread_ts] = parts[..] else {
            return Err(BotError::MalformedToken(format!(
                "thread token needs 3 fields, found {}",
                parts.len() + 1
            )));
        };
        ConversationScope::Thread {
            channel_id: non_empty(channel_id, "channel id")?.to_string(),
            thread_ts: non_empty(thread_ts, "thread timestamp")?.to_string(),
        }
    };

    Ok(SummaryDraft {
        scope,
        summary_text: decode_summary(encoded_summary)?,
    })
}

impl SummaryDraft {
    /// Shorten the summary so that the encoded token fits in a button value.
    ///
    /// Applied once when a draft is created; the shortened text is what the
    /// user sees, so later encode/decode round trips stay exact.
    #[must_use]
    pub fn fit_to_token_limit(mut self) -> Self {
        let budget = MAX_ACTION_VALUE_LEN.saturating_sub(scope_prefix(&self.scope).len());
        let full_len: usize = self.summary_text.chars().map(encoded_char_len).sum();
        if full_len <= budget {
            return self;
        }

        let keep_budget = budget.saturating_sub(encoded_char_len(ELLIPSIS));
        let mut used = 0;
        let mut cut = 0;
        for (idx, c) in self.summary_text.char_indices() {
            let len = encoded_char_len(c);
            if used + len > keep_budget {
                break;
            }
            used += len;
            cut = idx + c.len_utf8();
        }

        tracing::warn!(
            original_encoded_len = full_len,
            kept_bytes = cut,
            "Summary too long for a button value, shortening"
        );
        self.summary_text.truncate(cut);
        self.summary_text.push(ELLIPSIS);
        self
    }

    /// Whether [`Self::fit_to_token_limit`] cut this summary.
    ///
    /// A shortened token ends in the ellipsis and leaves less room than one
    /// more encoded character.
    #[must_use]
    pub fn is_shortened(&self) -> bool {
        self.summary_text.ends_with(ELLIPSIS)
            && encode(self).len() + MAX_ENCODED_CHAR_LEN > MAX_ACTION_VALUE_LEN
    }
}
