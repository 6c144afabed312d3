//! LLM API client module
//!
//! Calls an OpenAI-compatible chat completions endpoint to produce summaries.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info};

use super::prompt::{build_prompt, to_request_messages};
use crate::errors::BotError;

/// Produces a summary for a flattened conversation.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BotError::SummarizationUnavailable`] when no summary could be produced.
    async fn summarize(
        &self,
        conversation: &str,
        message_count: Option<u32>,
    ) -> Result<String, BotError>;
}

/// LLM API client for generating summaries
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model_name: String,
    http: Client,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, base_url: String, model_name: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name,
            http,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Pull the summary text out of a chat completions response body.
///
/// # Errors
///
/// Returns [`BotError::SummarizationUnavailable`] when `choices` is missing or
/// empty, or the first choice has no non-blank content.
pub fn extract_completion_text(body: &Value) -> Result<String, BotError> {
    let content = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty());

    content.map(str::to_string).ok_or_else(|| {
        BotError::SummarizationUnavailable("completion returned no content".to_string())
    })
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(
        &self,
        conversation: &str,
        message_count: Option<u32>,
    ) -> Result<String, BotError> {
        let prompt = build_prompt(conversation, message_count);

        #[cfg(feature = "debug-logs")]
        info!("Using completion prompt:\n{:?}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            "Requesting summary from {} ({} chars of conversation)",
            self.model_name,
            conversation.len()
        );

        let request_body = json!({
            "model": self.model_name,
            "messages": to_request_messages(&prompt),
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(kind = "transport", "Completion request failed: {}", e);
                BotError::SummarizationUnavailable(format!("completion request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            error!(kind = "transport", %status, "Completion API error: {}", error_text);
            return Err(BotError::SummarizationUnavailable(format!(
                "completion API error (status {status})"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            error!(kind = "transport", "Failed to parse completion response: {}", e);
            BotError::SummarizationUnavailable(format!("unparseable completion response: {e}"))
        })?;

        extract_completion_text(&body).inspect_err(|_| {
            error!(kind = "empty_completion", "Completion response had no usable content");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new(
            "test_key".to_string(),
            server.base_url(),
            "test-model".to_string(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn extracts_first_choice_content() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "  A summary \n"}}]
        });
        assert_eq!(extract_completion_text(&body).unwrap(), "A summary");
    }

    #[test]
    fn empty_choices_are_unavailable() {
        for body in [
            json!({"choices": []}),
            json!({}),
            json!({"choices": [{"message": {"content": ""}}]}),
            json!({"choices": [{"message": {"content": null}}]}),
        ] {
            assert!(matches!(
                extract_completion_text(&body),
                Err(BotError::SummarizationUnavailable(_))
            ));
        }
    }

    #[tokio::test]
    async fn posts_to_chat_completions_with_bearer_key() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test_key")
                .body_includes("\"model\":\"test-model\"");
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": "Short summary"}}]}));
        });

        let summary = client_for(&server)
            .summarize("alice: hi", Some(3))
            .await
            .unwrap();
        assert_eq!(summary, "Short summary");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn http_error_status_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(502).body("bad gateway");
        });

        let err = client_for(&server).summarize("x", None).await.unwrap_err();
        assert!(matches!(err, BotError::SummarizationUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_completion_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let err = client_for(&server).summarize("x", None).await.unwrap_err();
        assert!(matches!(err, BotError::SummarizationUnavailable(_)));
    }
}
