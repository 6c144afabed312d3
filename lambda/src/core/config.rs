use chrono_tz::Tz;
use std::env;

const DEFAULT_COMPLETION_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_COMPLETION_MODEL: &str = "meta-llama/llama-4-maverick:free";
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Notion destination settings. Every field is optional: a missing key or
/// destination makes exports report a failure instead of stopping the bot.
#[derive(Debug, Clone, Default)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub append_page_id: Option<String>,
    pub default_page_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub processing_queue_url: String,
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
    pub completion_api_key: String,
    pub completion_base_url: String,
    pub completion_model: String,
    pub completion_timeout_secs: u64,
    pub notion: NotionConfig,
    pub export_timezone: Tz,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let completion_timeout_secs = match optional("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| format!("COMPLETION_TIMEOUT_SECS: {}", e))?,
            None => DEFAULT_COMPLETION_TIMEOUT_SECS,
        };

        let export_timezone = match optional("EXPORT_TIMEZONE") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|e| format!("EXPORT_TIMEZONE: {}", e))?,
            None => Tz::UTC,
        };

        Ok(Self {
            processing_queue_url: env::var("PROCESSING_QUEUE_URL")
                .map_err(|e| format!("PROCESSING_QUEUE_URL: {}", e))?,
            slack_signing_secret: env::var("SLACK_SIGNING_SECRET")
                .map_err(|e| format!("SLACK_SIGNING_SECRET: {}", e))?,
            slack_bot_token: env::var("SLACK_BOT_TOKEN")
                .map_err(|e| format!("SLACK_BOT_TOKEN: {}", e))?,
            completion_api_key: env::var("OPENROUTER_API_KEY")
                .map_err(|e| format!("OPENROUTER_API_KEY: {}", e))?,
            completion_base_url: optional("COMPLETION_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string()),
            completion_model: optional("COMPLETION_MODEL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            completion_timeout_secs,
            notion: NotionConfig {
                api_key: optional("NOTION_API_KEY"),
                database_id: optional("NOTION_DATABASE_ID"),
                append_page_id: optional("NOTION_APPEND_PAGE_ID"),
                default_page_id: optional("NOTION_DEFAULT_PAGE_ID"),
            },
            export_timezone,
        })
    }
}
