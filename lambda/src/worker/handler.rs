use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use crate::ai::LlmClient;
use crate::core::config::AppConfig;
use crate::core::models::InteractionTask;
use crate::errors::BotError;
use crate::features::{Dispatcher, FlowState};
use crate::notion::NotionClient;
use crate::slack::SlackClient;

/// Decode every SQS record body into a task.
///
/// # Errors
///
/// Returns [`BotError::HandlerError`] naming the first record that is
/// missing a body or is not a task, or when there are no records at all.
pub fn parse_tasks(payload: &Value) -> Result<Vec<InteractionTask>, BotError> {
    let records = payload
        .get("Records")
        .and_then(Value::as_array)
        .filter(|records| !records.is_empty())
        .context("SQS event has no records")?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| -> anyhow::Result<InteractionTask> {
            let body = record
                .get("body")
                .and_then(Value::as_str)
                .with_context(|| format!("SQS record {index} has no body"))?;
            serde_json::from_str(body)
                .with_context(|| format!("SQS record {index} is not an InteractionTask"))
        })
        .collect::<anyhow::Result<_>>()
        .map_err(BotError::from)
}

/// Lambda handler for the Worker entrypoint. Runs each queued task.
///
/// Flow failures were already shown to the user, so they end in `Ok` and
/// SQS does not redeliver the message.
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<(), Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let tasks = parse_tasks(&event.payload).inspect_err(|e| error!("{}", e))?;
    info!("Worker received {} task(s)", tasks.len());

    let chat = SlackClient::new(config.slack_bot_token.clone());
    let summarizer = LlmClient::new(
        config.completion_api_key.clone(),
        config.completion_base_url.clone(),
        config.completion_model.clone(),
        Duration::from_secs(config.completion_timeout_secs),
    );
    let exporter = NotionClient::new(&config.notion);
    let dispatcher = Dispatcher::new(&chat, &summarizer, &exporter, config.export_timezone);

    for task in &tasks {
        match dispatcher.run(task).await {
            FlowState::Error { message } => {
                error!(
                    correlation_id = %task.correlation_id(),
                    "Task ended with an error screen: {}", message
                );
            }
            state => info!(
                correlation_id = %task.correlation_id(),
                "Task finished: {:?}", state
            ),
        }
    }

    Ok(())
}

pub use self::function_handler as handler;
