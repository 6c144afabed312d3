//! Markdown rendering of a summary draft.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use super::fetch::{excerpt, thread_root_text};
use crate::core::models::{ConversationScope, SummaryDraft};
use crate::errors::BotError;
use crate::slack::{ChatPlatform, TextFile};

/// Preview length shown inline on the Markdown screen.
pub const PREVIEW_CHARS: usize = 500;

/// Appended to a preview that was cut.
pub const TRUNCATION_MARKER: &str = "...\n(truncated)";

const TOPIC_CHARS: usize = 50;

const FOOTER: &str = "---\n\n*This summary was generated automatically.*\n";

/// What the Markdown header for a draft needs besides the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentMeta {
    Thread {
        channel_name: String,
        topic: String,
        permalink: String,
    },
    Channel {
        channel_name: String,
        message_count: u32,
        archive_url: String,
    },
}

impl DocumentMeta {
    fn channel_name(&self) -> &str {
        match self {
            DocumentMeta::Thread { channel_name, .. }
            | DocumentMeta::Channel { channel_name, .. } => channel_name,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DocumentMeta::Thread { .. } => "thread",
            DocumentMeta::Channel { .. } => "channel",
        }
    }
}

fn render_failure(e: BotError) -> BotError {
    match e {
        BotError::RenderOrUploadFailure(_) => e,
        other => BotError::RenderOrUploadFailure(other.to_string()),
    }
}

/// Resolve channel name, permalink or archive URL for a draft.
///
/// # Errors
///
/// Returns [`BotError::RenderOrUploadFailure`] when any lookup fails.
pub async fn document_meta(
    chat: &dyn ChatPlatform,
    scope: &ConversationScope,
) -> Result<DocumentMeta, BotError> {
    let channel_name = chat
        .channel_name(scope.channel_id())
        .await
        .map_err(render_failure)?;

    match scope {
        ConversationScope::Thread {
            channel_id,
            thread_ts,
        } => {
            let root = thread_root_text(chat, channel_id, thread_ts)
                .await
                .map_err(render_failure)?;
            let permalink = chat
                .permalink(channel_id, thread_ts)
                .await
                .map_err(render_failure)?;
            Ok(DocumentMeta::Thread {
                channel_name,
                topic: excerpt(&root, TOPIC_CHARS, "..."),
                permalink,
            })
        }
        ConversationScope::Channel {
            channel_id,
            message_count,
        } => {
            let domain = chat.team_domain().await.map_err(render_failure)?;
            Ok(DocumentMeta::Channel {
                channel_name,
                message_count: *message_count,
                archive_url: format!("https://{domain}.slack.com/archives/{channel_id}"),
            })
        }
    }
}

/// Render the full Markdown document.
#[must_use]
pub fn render_document<Tz>(meta: &DocumentMeta, summary: &str, exported_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let when = exported_at.format("%Y-%m-%d %H:%M %Z");
    let info = match meta {
        DocumentMeta::Thread {
            channel_name,
            topic,
            permalink,
        } => format!(
            "# {channel_name} - Thread summary\n\n\
             ## Source thread\n\
             - **Topic**: {topic}\n\
             - **Channel**: #{channel_name}\n\
             - **URL**: {permalink}\n\
             - **Exported at**: {when}\n"
        ),
        DocumentMeta::Channel {
            channel_name,
            message_count,
            archive_url,
        } => format!(
            "# {channel_name} - Channel summary\n\n\
             ## Channel\n\
             - **Channel**: #{channel_name}\n\
             - **Messages**: latest {message_count}\n\
             - **URL**: {archive_url}\n\
             - **Exported at**: {when}\n"
        ),
    };

    format!("{info}\n## Summary\n{summary}\n\n{FOOTER}")
}

/// `{channel}_{thread|channel}_summary_{YYYYMMDD}.md`
#[must_use]
pub fn file_name<Tz>(meta: &DocumentMeta, exported_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}_{}_summary_{}.md",
        meta.channel_name(),
        meta.kind(),
        exported_at.format("%Y%m%d")
    )
}

/// Inline preview: at most [`PREVIEW_CHARS`] characters plus the marker when cut.
#[must_use]
pub fn preview(markdown: &str) -> String {
    excerpt(markdown, PREVIEW_CHARS, TRUNCATION_MARKER)
}

/// Build the uploadable Markdown file for a draft.
///
/// # Errors
///
/// Returns [`BotError::RenderOrUploadFailure`] when metadata lookups fail.
pub async fn render_markdown_file<Tz>(
    chat: &dyn ChatPlatform,
    draft: &SummaryDraft,
    exported_at: &DateTime<Tz>,
) -> Result<TextFile, BotError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let meta = document_meta(chat, &draft.scope).await?;
    let title = match meta {
        DocumentMeta::Thread { .. } => "Thread summary",
        DocumentMeta::Channel { .. } => "Channel summary",
    };
    Ok(TextFile {
        filename: file_name(&meta, exported_at),
        title: title.to_string(),
        content: render_document(&meta, &draft.summary_text, exported_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 9, 30, 0).unwrap()
    }

    #[test]
    fn preview_is_verbatim_up_to_limit() {
        let exact = "x".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);
    }

    #[test]
    fn preview_cuts_to_exactly_limit_plus_marker() {
        let long = "あ".repeat(PREVIEW_CHARS + 1);
        let p = preview(&long);
        let body = p.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(body.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn file_name_follows_scope() {
        let meta = DocumentMeta::Channel {
            channel_name: "eng-team".into(),
            message_count: 42,
            archive_url: "https://acme.slack.com/archives/C1".into(),
        };
        assert_eq!(file_name(&meta, &at()), "eng-team_channel_summary_20250307.md");
    }

    #[test]
    fn thread_document_layout() {
        let meta = DocumentMeta::Thread {
            channel_name: "general".into(),
            topic: "Release plan".into(),
            permalink: "https://acme.slack.com/archives/C1/p1".into(),
        };
        let doc = render_document(&meta, "It ships Friday.", &at());
        assert!(doc.starts_with("# general - Thread summary\n"));
        assert!(doc.contains("- **Topic**: Release plan\n"));
        assert!(doc.contains("- **URL**: https://acme.slack.com/archives/C1/p1\n"));
        assert!(doc.contains("- **Exported at**: 2025-03-07 09:30 UTC\n"));
        assert!(doc.contains("## Summary\nIt ships Friday.\n"));
        assert!(doc.ends_with(FOOTER));
    }

    #[test]
    fn channel_document_layout() {
        let meta = DocumentMeta::Channel {
            channel_name: "eng-team".into(),
            message_count: 42,
            archive_url: "https://acme.slack.com/archives/C1".into(),
        };
        let doc = render_document(&meta, "s", &at());
        assert!(doc.starts_with("# eng-team - Channel summary\n"));
        assert!(doc.contains("- **Messages**: latest 42\n"));
        assert!(doc.contains("https://acme.slack.com/archives/C1"));
    }
}
