//! Slack API client module
//!
//! Implements [`ChatPlatform`] over the Slack Web API. Typed calls go through
//! slack-morphism; everything else is a raw `reqwest` call checked for `ok`.
//! Calls are made once; failures are surfaced to the flow that made them.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::SlackApiUsersInfoRequest;
use slack_morphism::{SlackApiToken, SlackApiTokenValue, SlackUserId};
use std::time::Duration;
use tracing::{debug, warn};

use super::platform::{ChatPlatform, ConversationMessage, HistoryPage, TextFile};
use super::views::Screen;
use crate::errors::BotError;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// `conversations.history` and `conversations.replies` return at most this many per page.
const MAX_PAGE_SIZE: u32 = 200;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a BotError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    messages: Vec<ConversationMessage>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

impl From<PageResponse> for HistoryPage {
    fn from(resp: PageResponse) -> Self {
        HistoryPage {
            messages: resp.messages,
            next_cursor: resp
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty()),
        }
    }
}

fn ensure_ok(method: &str, body: &Value) -> Result<(), BotError> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        Ok(())
    } else {
        Err(BotError::ApiError(format!(
            "{method} error: {}",
            body.get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
        )))
    }
}

/// Payload for `chat.postMessage` / `chat.postEphemeral` carrying a screen.
#[must_use]
pub fn screen_payload(channel_id: &str, thread_ts: Option<&str>, screen: &Screen) -> Value {
    let mut payload = json!({
        "channel": channel_id,
        "text": screen.text,
        "blocks": screen.blocks,
    });
    if let Some(ts) = thread_ts {
        payload["thread_ts"] = Value::String(ts.to_string());
    }
    payload
}

/// Payload for a `response_url` POST. Responses are always ephemeral.
#[must_use]
pub fn response_url_payload(screen: &Screen, replace_original: bool) -> Value {
    json!({
        "response_type": "ephemeral",
        "replace_original": replace_original,
        "text": screen.text,
        "blocks": screen.blocks,
    })
}

pub struct SlackClient {
    token: SlackApiToken,
    api_base: String,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, SLACK_API_BASE)
    }

    #[must_use]
    pub fn with_api_base(token: String, api_base: &str) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn bearer(&self) -> &str {
        &self.token.token_value.0
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    async fn read_body(method: &str, resp: reqwest::Response) -> Result<Value, BotError> {
        if !resp.status().is_success() {
            return Err(BotError::ApiError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| BotError::ApiError(format!("{method} JSON parse error: {e}")))?;
        ensure_ok(method, &body)?;
        Ok(body)
    }

    /// Form-encoded call, for read methods that do not accept JSON bodies.
    async fn call_form(&self, method: &str, params: &[(&str, String)]) -> Result<Value, BotError> {
        let resp = HTTP_CLIENT
            .post(self.url(method))
            .bearer_auth(self.bearer())
            .form(params)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("Failed to call {method}: {e}")))?;
        Self::read_body(method, resp).await
    }

    async fn call_json(&self, method: &str, payload: &Value) -> Result<Value, BotError> {
        let resp = HTTP_CLIENT
            .post(self.url(method))
            .bearer_auth(self.bearer())
            .json(payload)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("Failed to call {method}: {e}")))?;
        Self::read_body(method, resp).await
    }

    async fn fetch_page(
        &self,
        method: &str,
        mut params: Vec<(&str, String)>,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError> {
        if let Some(c) = cursor {
            params.push(("cursor", c.to_string()));
        }
        let body = self.call_form(method, &params).await?;
        let page: PageResponse = serde_json::from_value(body)
            .map_err(|e| BotError::ParseError(format!("{method} response: {e}")))?;
        Ok(page.into())
    }

    fn session_client() -> Result<&'static SlackHyperClient, BotError> {
        SLACK_CLIENT
            .as_ref()
            .ok_or_else(|| BotError::ApiError("Slack HTTP connector not initialized".to_string()))
    }

    /// Open (or reuse) the bot's DM channel with `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API call fails.
    pub async fn get_user_im_channel(&self, user_id: &str) -> Result<String, BotError> {
        let body = self
            .call_json("conversations.open", &json!({ "users": user_id }))
            .await?;
        body.get("channel")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BotError::ApiError("conversations.open missing channel id".into()))
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError> {
        let params = vec![
            ("channel", channel_id.to_string()),
            ("ts", thread_ts.to_string()),
            ("limit", MAX_PAGE_SIZE.to_string()),
        ];
        self.fetch_page("conversations.replies", params, cursor).await
    }

    async fn channel_history(
        &self,
        channel_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, BotError> {
        let params = vec![
            ("channel", channel_id.to_string()),
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        self.fetch_page("conversations.history", params, cursor).await
    }

    async fn user_display_name(&self, user_id: &str) -> Result<String, BotError> {
        let session = Self::session_client()?.open_session(&self.token);
        let user_info_req = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));

        let info = session.users_info(&user_info_req).await?;
        let profile = info.user.profile.as_ref();
        profile
            .and_then(|p| p.real_name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| {
                profile
                    .and_then(|p| p.display_name.clone())
                    .filter(|n| !n.is_empty())
            })
            .ok_or_else(|| BotError::ApiError(format!("users.info: no name for {user_id}")))
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String, BotError> {
        let body = self
            .call_form("conversations.info", &[("channel", channel_id.to_string())])
            .await?;
        body.get("channel")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BotError::ApiError("conversations.info: missing channel name".into()))
    }

    async fn team_domain(&self) -> Result<String, BotError> {
        let body = self.call_form("team.info", &[]).await?;
        body.get("team")
            .and_then(|t| t.get("domain"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BotError::ApiError("team.info: missing domain".into()))
    }

    async fn permalink(&self, channel_id: &str, message_ts: &str) -> Result<String, BotError> {
        let body = self
            .call_form(
                "chat.getPermalink",
                &[
                    ("channel", channel_id.to_string()),
                    ("message_ts", message_ts.to_string()),
                ],
            )
            .await?;
        body.get("permalink")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BotError::ApiError("No permalink in response".to_string()))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), BotError> {
        let mut payload = json!({
            "channel": channel_id,
            "text": text,
        });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = Value::String(ts.to_string());
        }
        self.call_json("chat.postMessage", &payload).await?;
        Ok(())
    }

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        thread_ts: Option<&str>,
        screen: &Screen,
    ) -> Result<(), BotError> {
        let mut payload = screen_payload(channel_id, thread_ts, screen);
        payload["user"] = Value::String(user_id.to_string());
        self.call_json("chat.postEphemeral", &payload).await?;
        Ok(())
    }

    async fn respond(
        &self,
        response_url: &str,
        screen: &Screen,
        replace_original: bool,
    ) -> Result<(), BotError> {
        let resp = HTTP_CLIENT
            .post(response_url)
            .json(&response_url_payload(screen, replace_original))
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("Failed to post to response_url: {e}")))?;

        // response_url answers with a bare "ok" or a JSON error body.
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(BotError::ApiError(format!(
                "response_url HTTP {status}: {text}"
            )));
        }
        if let Ok(body) = serde_json::from_str::<Value>(&text) {
            if body.get("ok").and_then(Value::as_bool) == Some(false) {
                ensure_ok("response_url", &body)?;
            }
        }
        Ok(())
    }

    async fn send_dm(&self, user_id: &str, screen: &Screen) -> Result<(), BotError> {
        let im_channel = self.get_user_im_channel(user_id).await?;
        self.call_json("chat.postMessage", &screen_payload(&im_channel, None, screen))
            .await?;
        Ok(())
    }

    async fn upload_text_file(&self, user_id: &str, file: &TextFile) -> Result<String, BotError> {
        let bytes = file.content.as_bytes().to_vec();
        let get_upload = self
            .call_form(
                "files.getUploadURLExternal",
                &[
                    ("filename", file.filename.clone()),
                    ("length", bytes.len().to_string()),
                ],
            )
            .await?;
        let upload_url = get_upload
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BotError::ApiError("files.getUploadURLExternal missing upload_url".into())
            })?;
        let file_id = get_upload
            .get("file_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BotError::ApiError("files.getUploadURLExternal missing file_id".into())
            })?
            .to_string();

        let upload_resp = HTTP_CLIENT
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "text/markdown; charset=utf-8")
            .body(bytes)
            .send()
            .await
            .map_err(|e| BotError::HttpError(format!("Failed to upload file bytes: {e}")))?;
        if !upload_resp.status().is_success() {
            return Err(BotError::ApiError(format!(
                "file upload HTTP {}",
                upload_resp.status()
            )));
        }

        let im_channel = self.get_user_im_channel(user_id).await?;
        let complete = self
            .call_json(
                "files.completeUploadExternal",
                &json!({
                    "files": [{ "id": file_id, "title": file.title }],
                    "channel_id": im_channel,
                }),
            )
            .await?;

        if let Some(permalink) = complete
            .get("files")
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(|f| f.get("permalink"))
            .and_then(Value::as_str)
        {
            return Ok(permalink.to_string());
        }

        debug!("completeUploadExternal had no permalink, asking files.info");
        let info = self.call_form("files.info", &[("file", file_id)]).await?;
        info.get("file")
            .and_then(|f| f.get("permalink"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BotError::ApiError("files.info missing permalink".into()))
    }

    async fn open_modal(&self, trigger_id: &str, view: &Value) -> Result<(), BotError> {
        let payload = json!({
            "trigger_id": trigger_id,
            "view": view
        });
        self.call_json("views.open", &payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> SlackClient {
        SlackClient::with_api_base("xoxb-test".to_string(), &server.base_url())
    }

    fn screen() -> Screen {
        Screen {
            text: "fallback".to_string(),
            blocks: json!([{"type": "section", "text": {"type": "mrkdwn", "text": "hi"}}]),
        }
    }

    #[test]
    fn response_url_payload_is_always_ephemeral() {
        let p = response_url_payload(&screen(), true);
        assert_eq!(p["response_type"], "ephemeral");
        assert_eq!(p["replace_original"], true);
        assert_eq!(response_url_payload(&screen(), false)["replace_original"], false);
    }

    #[test]
    fn screen_payload_sets_thread_only_when_given() {
        assert!(screen_payload("C1", None, &screen()).get("thread_ts").is_none());
        assert_eq!(screen_payload("C1", Some("1.2"), &screen())["thread_ts"], "1.2");
    }

    #[tokio::test]
    async fn history_page_carries_cursor() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/conversations.history")
                .header("authorization", "Bearer xoxb-test")
                .body_includes("channel=C1")
                .body_includes("cursor=abc");
            then.status(200).json_body(json!({
                "ok": true,
                "messages": [
                    {"type": "message", "user": "U1", "text": "hello", "ts": "2.0"},
                    {"type": "message", "subtype": "channel_join", "text": "joined", "ts": "1.0"}
                ],
                "response_metadata": {"next_cursor": "def"}
            }));
        });

        let page = client(&server)
            .channel_history("C1", 50, Some("abc"))
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[1].subtype.as_deref(), Some("channel_join"));
        assert_eq!(page.next_cursor.as_deref(), Some("def"));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn empty_cursor_means_last_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/conversations.replies");
            then.status(200).json_body(json!({
                "ok": true,
                "messages": [{"user": "U1", "text": "root", "ts": "1.0"}],
                "response_metadata": {"next_cursor": ""}
            }));
        });

        let page = client(&server).thread_replies("C1", "1.0", None).await.unwrap();
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn not_ok_is_an_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat.postEphemeral");
            then.status(200)
                .json_body(json!({"ok": false, "error": "user_not_in_channel"}));
        });

        let err = client(&server)
            .post_ephemeral("C1", "U1", None, &screen())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("user_not_in_channel"));
    }

    #[tokio::test]
    async fn channel_name_and_team_domain() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/conversations.info");
            then.status(200)
                .json_body(json!({"ok": true, "channel": {"id": "C1", "name": "eng-team"}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/team.info");
            then.status(200)
                .json_body(json!({"ok": true, "team": {"id": "T1", "domain": "acme"}}));
        });

        let c = client(&server);
        assert_eq!(c.channel_name("C1").await.unwrap(), "eng-team");
        assert_eq!(c.team_domain().await.unwrap(), "acme");
    }

    #[tokio::test]
    async fn respond_posts_to_response_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/actions/T1/123/abc")
                .body_includes("\"replace_original\":true");
            then.status(200).body("ok");
        });

        client(&server)
            .respond(&server.url("/actions/T1/123/abc"), &screen(), true)
            .await
            .unwrap();
        mock.assert_calls(1);
    }

    fn markdown_file() -> TextFile {
        TextFile {
            filename: "general_thread_summary_20260101.md".to_string(),
            title: "general thread summary".to_string(),
            content: "# Summary\n\nhello".to_string(),
        }
    }

    /// Mocks the steps before `files.completeUploadExternal`.
    fn mock_upload_start(server: &MockServer, upload_status: u16) -> httpmock::Mock<'_> {
        let upload_url = server.url("/upload/F1");
        server.mock(|when, then| {
            when.method(POST)
                .path("/files.getUploadURLExternal")
                .body_includes("filename=general_thread_summary_20260101.md")
                .body_includes("length=16");
            then.status(200)
                .json_body(json!({"ok": true, "upload_url": upload_url, "file_id": "F1"}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/conversations.open")
                .body_includes("\"users\":\"U9\"");
            then.status(200)
                .json_body(json!({"ok": true, "channel": {"id": "D9"}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/upload/F1").body("# Summary\n\nhello");
            then.status(upload_status).body("OK");
        })
    }

    #[tokio::test]
    async fn upload_returns_permalink_from_complete() {
        let server = MockServer::start();
        let bytes = mock_upload_start(&server, 200);
        let complete = server.mock(|when, then| {
            when.method(POST)
                .path("/files.completeUploadExternal")
                .body_includes("\"channel_id\":\"D9\"")
                .body_includes("\"id\":\"F1\"");
            then.status(200).json_body(json!({
                "ok": true,
                "files": [{"id": "F1", "permalink": "https://acme.slack.com/files/U0/F1/x.md"}]
            }));
        });

        let url = client(&server)
            .upload_text_file("U9", &markdown_file())
            .await
            .unwrap();
        assert_eq!(url, "https://acme.slack.com/files/U0/F1/x.md");
        bytes.assert_calls(1);
        complete.assert_calls(1);
    }

    #[tokio::test]
    async fn upload_falls_back_to_files_info_for_permalink() {
        let server = MockServer::start();
        mock_upload_start(&server, 200);
        server.mock(|when, then| {
            when.method(POST).path("/files.completeUploadExternal");
            then.status(200)
                .json_body(json!({"ok": true, "files": [{"id": "F1"}]}));
        });
        let info = server.mock(|when, then| {
            when.method(POST).path("/files.info").body_includes("file=F1");
            then.status(200).json_body(json!({
                "ok": true,
                "file": {"id": "F1", "permalink": "https://acme.slack.com/files/U0/F1/info.md"}
            }));
        });

        let url = client(&server)
            .upload_text_file("U9", &markdown_file())
            .await
            .unwrap();
        assert_eq!(url, "https://acme.slack.com/files/U0/F1/info.md");
        info.assert_calls(1);
    }

    #[tokio::test]
    async fn failed_byte_upload_stops_before_complete() {
        let server = MockServer::start();
        mock_upload_start(&server, 500);
        let complete = server.mock(|when, then| {
            when.method(POST).path("/files.completeUploadExternal");
            then.status(200).json_body(json!({"ok": true, "files": []}));
        });

        let err = client(&server)
            .upload_text_file("U9", &markdown_file())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("file upload HTTP 500"), "{err}");
        complete.assert_calls(0);
    }
}
