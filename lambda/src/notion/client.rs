//! Notion API client used to export summaries.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info};

use crate::core::config::NotionConfig;
use crate::core::models::ExportResult;

const NOTION_API_BASE: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion caps a single rich text object at this many characters.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;

/// Writes a titled document to an external document store.
#[async_trait]
pub trait DocumentExporter: Send + Sync {
    async fn export(&self, title: &str, body: &str) -> ExportResult;
}

/// Where an exported summary lands, in order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// New row in a database, titled through its `Name` property.
    Database(String),
    /// Heading and paragraphs appended to an existing page.
    AppendPage(String),
    /// New child page under a parent page.
    ParentPage(String),
}

impl Destination {
    #[must_use]
    pub fn resolve(config: &NotionConfig) -> Option<Self> {
        config
            .database_id
            .clone()
            .map(Destination::Database)
            .or_else(|| config.append_page_id.clone().map(Destination::AppendPage))
            .or_else(|| config.default_page_id.clone().map(Destination::ParentPage))
    }
}

/// Split text into chunks of at most [`MAX_RICH_TEXT_CHARS`] characters.
#[must_use]
pub fn chunk_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_RICH_TEXT_CHARS)
        .map(|c| c.iter().collect())
        .collect()
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

fn paragraph_blocks(body: &str) -> Vec<Value> {
    chunk_text(body)
        .iter()
        .map(|chunk| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text(chunk) }
            })
        })
        .collect()
}

/// Request body for `POST /v1/pages`.
#[must_use]
pub fn build_page_request(destination: &Destination, title: &str, body: &str) -> Value {
    let (parent, title_property) = match destination {
        Destination::Database(id) => (json!({ "database_id": id }), "Name"),
        Destination::AppendPage(id) | Destination::ParentPage(id) => {
            (json!({ "type": "page_id", "page_id": id }), "title")
        }
    };

    let mut properties = serde_json::Map::new();
    properties.insert(
        title_property.to_string(),
        json!({ "title": rich_text(title) }),
    );

    json!({
        "parent": parent,
        "properties": properties,
        "children": paragraph_blocks(body),
    })
}

/// Request body for `PATCH /v1/blocks/{id}/children`.
#[must_use]
pub fn build_append_request(title: &str, body: &str) -> Value {
    let mut children = vec![json!({
        "object": "block",
        "type": "heading_3",
        "heading_3": { "rich_text": rich_text(title) }
    })];
    children.extend(paragraph_blocks(body));
    json!({ "children": children })
}

/// Notion page links are the page id without dashes.
#[must_use]
pub fn page_url(page_id: &str) -> String {
    format!("https://notion.so/{}", page_id.replace('-', ""))
}

pub struct NotionClient {
    api_key: Option<String>,
    destination: Option<Destination>,
    api_base: String,
    http: Client,
}

impl NotionClient {
    #[must_use]
    pub fn new(config: &NotionConfig) -> Self {
        Self::with_api_base(config, NOTION_API_BASE)
    }

    #[must_use]
    pub fn with_api_base(config: &NotionConfig, api_base: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key: config.api_key.clone(),
            destination: Destination::resolve(config),
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        api_key: &str,
        payload: &Value,
    ) -> Result<Value, String> {
        let resp = request
            .bearer_auth(api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(payload)
            .send()
            .await
            .map_err(|e| format!("Notion request failed: {e}"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse Notion response (status {status}): {e}"))?;

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(format!("Notion API error (status {status}): {message}"));
        }
        Ok(body)
    }

    async fn export_to(
        &self,
        api_key: &str,
        destination: &Destination,
        title: &str,
        body: &str,
    ) -> Result<String, String> {
        match destination {
            Destination::AppendPage(page_id) => {
                let url = format!("{}/v1/blocks/{page_id}/children", self.api_base);
                self.send(
                    self.http.patch(url),
                    api_key,
                    &build_append_request(title, body),
                )
                .await?;
                Ok(page_url(page_id))
            }
            Destination::Database(_) | Destination::ParentPage(_) => {
                let url = format!("{}/v1/pages", self.api_base);
                let created = self
                    .send(
                        self.http.post(url),
                        api_key,
                        &build_page_request(destination, title, body),
                    )
                    .await?;
                created
                    .get("id")
                    .and_then(Value::as_str)
                    .map(page_url)
                    .ok_or_else(|| "Notion response did not include a page id".to_string())
            }
        }
    }
}

#[async_trait]
impl DocumentExporter for NotionClient {
    async fn export(&self, title: &str, body: &str) -> ExportResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return ExportResult::failed("Notion API key is not configured");
        };
        let Some(destination) = self.destination.as_ref() else {
            return ExportResult::failed("No Notion destination is configured");
        };

        match self.export_to(api_key, destination, title, body).await {
            Ok(url) => {
                info!("Exported summary to Notion: {}", url);
                ExportResult::ok(url)
            }
            Err(e) => {
                error!("Notion export failed: {}", e);
                ExportResult::failed(e)
            }
        }
    }
}
