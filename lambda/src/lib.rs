//! Summary bot - a Slack app that summarizes threads and channels with an LLM.
//!
//! The bot runs as two Lambdas:
//! 1. An API Lambda that verifies Slack requests, acks them and queues an
//!    [`core::models::InteractionTask`] on SQS
//! 2. A Worker Lambda that runs each task through [`features::Dispatcher`]
//!
//! A generated summary is offered privately to the requester, who can publish
//! it, export it to Notion or download it as Markdown. No draft is stored:
//! each button carries the draft in its action token (see [`core::token`]).
//!
//! # Example
//!
//! ```no_run
//! use summary_bot::core::config::AppConfig;
//! use summary_bot::core::models::{ConversationScope, InteractionTask};
//! use summary_bot::features::Dispatcher;
//! use summary_bot::{LlmClient, NotionClient, SlackClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     summary_bot::setup_logging();
//!     let config = AppConfig::from_env()?;
//!
//!     let chat = SlackClient::new(config.slack_bot_token.clone());
//!     let summarizer = LlmClient::new(
//!         config.completion_api_key.clone(),
//!         config.completion_base_url.clone(),
//!         config.completion_model.clone(),
//!         Duration::from_secs(config.completion_timeout_secs),
//!     );
//!     let exporter = NotionClient::new(&config.notion);
//!     let dispatcher = Dispatcher::new(&chat, &summarizer, &exporter, config.export_timezone);
//!
//!     let task = InteractionTask::Summarize {
//!         correlation_id: "demo".into(),
//!         user_id: "U123".into(),
//!         scope: ConversationScope::Channel {
//!             channel_id: "C12345678".into(),
//!             message_count: 100,
//!         },
//!         response_url: None,
//!     };
//!     let state = dispatcher.run(&task).await;
//!     println!("{state:?}");
//!     Ok(())
//! }
//! ```
// Module declarations
pub mod ai;
pub mod api;
pub mod core;
pub mod errors;
pub mod features;
pub mod notion;
pub mod slack;
pub mod worker;

pub use ai::{LlmClient, Summarizer};
pub use errors::BotError;
pub use notion::{DocumentExporter, NotionClient};
pub use slack::{ChatPlatform, SlackClient};

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. It should be called at the start of each Lambda
/// binary. Calling it again is a no-op.
///
/// # Example
///
/// ```
/// summary_bot::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
