#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use summary_bot::core::models::ExportResult;
use summary_bot::errors::BotError;
use summary_bot::slack::{ChatPlatform, ConversationMessage, HistoryPage, Screen, TextFile};
use summary_bot::{DocumentExporter, Summarizer};

/// One delivery of a private screen.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub via: &'static str,
    pub user_id: String,
    pub replace_original: bool,
    pub screen: Screen,
}

pub fn msg(user: Option<&str>, text: &str) -> ConversationMessage {
    ConversationMessage {
        user: user.map(str::to_string),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// In-memory chat platform that records every write.
#[derive(Default)]
pub struct FakeChat {
    /// Pages returned by `thread_replies`, in cursor order.
    pub replies: Vec<Vec<ConversationMessage>>,
    /// Pages returned by `channel_history`, newest first, in cursor order.
    pub history: Vec<Vec<ConversationMessage>>,
    pub names: HashMap<String, String>,
    pub channel_names: HashMap<String, String>,
    pub team_domain: String,
    pub fail_respond: bool,
    pub fail_ephemeral: bool,
    pub fail_post: bool,
    pub fail_upload: bool,

    pub name_lookups: AtomicUsize,
    pub history_limits: Mutex<Vec<u32>>,
    pub posts: Mutex<Vec<(String, Option<String>, String)>>,
    pub delivered: Mutex<Vec<Delivered>>,
    pub uploads: Mutex<Vec<(String, TextFile)>>,
}

impl FakeChat {
    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn last_screen(&self) -> Screen {
        self.delivered().last().expect("nothing delivered").screen.clone()
    }

    pub fn posts(&self) -> Vec<(String, Option<String>, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, TextFile)> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, via: &'static str, user_id: &str, replace_original: bool, screen: &Screen) {
        self.delivered.lock().unwrap().push(Delivered {
            via,
            user_id: user_id.to_string(),
            replace_original,
            screen: screen.clone(),
        });
    }
}

fn page(pages: &[Vec<ConversationMessage>], cursor: Option<&str>) -> HistoryPage {
    let index: usize = cursor.map_or(0, |c| c.parse().unwrap());
    let messages = pages.get(index).cloned().unwrap_or_default();
    let next_cursor = (index + 1 < pages.len()).then(|| (index + 1).to_string());
    HistoryPage {
        messages,
        next_cursor,
    }
}

fn unavailable(what: &str) -> BotError {
    BotError::ApiError(format!("{what} unavailable"))
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn thread_replies(
        &self,
        _channel_id: &str,
        _thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError> {
        Ok(page(&self.replies, cursor))
    }

    async fn channel_history(
        &self,
        _channel_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError> {
        self.history_limits.lock().unwrap().push(limit);
        Ok(page(&self.history, cursor))
    }

    async fn user_display_name(&self, user_id: &str) -> Result<String, BotError> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        self.names
            .get(user_id)
            .cloned()
            .ok_or_else(|| unavailable("users.info"))
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String, BotError> {
        self.channel_names
            .get(channel_id)
            .cloned()
            .ok_or_else(|| unavailable("conversations.info"))
    }

    async fn team_domain(&self) -> Result<String, BotError> {
        Ok(self.team_domain.clone())
    }

    async fn permalink(&self, channel_id: &str, message_ts: &str) -> Result<String, BotError> {
        let ts = message_ts.replace('.', "");
        Ok(format!(
            "https://{}.slack.com/archives/{channel_id}/p{ts}",
            self.team_domain
        ))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), BotError> {
        if self.fail_post {
            return Err(unavailable("chat.postMessage"));
        }
        self.posts.lock().unwrap().push((
            channel_id.to_string(),
            thread_ts.map(str::to_string),
            text.to_string(),
        ));
        Ok(())
    }

    async fn post_ephemeral(
        &self,
        _channel_id: &str,
        user_id: &str,
        _thread_ts: Option<&str>,
        screen: &Screen,
    ) -> Result<(), BotError> {
        if self.fail_ephemeral {
            return Err(unavailable("chat.postEphemeral"));
        }
        self.record("ephemeral", user_id, false, screen);
        Ok(())
    }

    async fn respond(
        &self,
        _response_url: &str,
        screen: &Screen,
        replace_original: bool,
    ) -> Result<(), BotError> {
        if self.fail_respond {
            return Err(unavailable("response_url"));
        }
        self.record("response_url", "", replace_original, screen);
        Ok(())
    }

    async fn send_dm(&self, user_id: &str, screen: &Screen) -> Result<(), BotError> {
        self.record("dm", user_id, false, screen);
        Ok(())
    }

    async fn upload_text_file(&self, user_id: &str, file: &TextFile) -> Result<String, BotError> {
        if self.fail_upload {
            return Err(unavailable("files.completeUploadExternal"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((user_id.to_string(), file.clone()));
        Ok(format!("https://files.slack.com/{}", file.filename))
    }

    async fn open_modal(&self, _trigger_id: &str, _view: &Value) -> Result<(), BotError> {
        Ok(())
    }
}

/// Returns a fixed summary, or fails when `summary` is `None`.
pub struct FakeSummarizer {
    pub summary: Option<String>,
    pub calls: AtomicUsize,
    pub last_input: Mutex<Option<(String, Option<u32>)>>,
}

impl FakeSummarizer {
    pub fn returning(summary: &str) -> Self {
        Self {
            summary: Some(summary.to_string()),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(
        &self,
        conversation: &str,
        message_count: Option<u32>,
    ) -> Result<String, BotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some((conversation.to_string(), message_count));
        self.summary
            .clone()
            .ok_or_else(|| BotError::SummarizationUnavailable("no choices".to_string()))
    }
}

/// Records export calls; fails with `error` when set.
#[derive(Default)]
pub struct FakeExporter {
    pub error: Option<String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeExporter {
    pub fn failing(reason: &str) -> Self {
        Self {
            error: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentExporter for FakeExporter {
    async fn export(&self, title: &str, body: &str) -> ExportResult {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        match &self.error {
            Some(reason) => ExportResult::failed(reason.clone()),
            None => ExportResult::ok("https://notion.so/abc123"),
        }
    }
}
