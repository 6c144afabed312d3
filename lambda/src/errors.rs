use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Malformed action token: {0}")]
    MalformedToken(String),

    #[error("No messages to summarize")]
    EmptyConversation,

    #[error("Summarization unavailable: {0}")]
    SummarizationUnavailable(String),

    #[error("Export failed: {0}")]
    ExportFailure(String),

    #[error("Markdown render or upload failed: {0}")]
    RenderOrUploadFailure(String),

    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("Failed to parse Slack event: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),
}

impl BotError {
    /// Text shown to the requesting user when a flow ends in this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BotError::MalformedToken(_) => "Could not identify the original message.".to_string(),
            BotError::EmptyConversation => {
                "There are no messages to summarize in this conversation.".to_string()
            }
            BotError::SummarizationUnavailable(_) => {
                "Sorry, I couldn't generate a summary right now. Please try again.".to_string()
            }
            BotError::ExportFailure(reason) => format!("❌ Export to Notion failed: {reason}"),
            BotError::RenderOrUploadFailure(reason) => {
                format!("❌ Could not create the Markdown file: {reason}")
            }
            other => format!("An error occurred: {other}"),
        }
    }
}

impl From<SlackClientError> for BotError {
    fn from(error: SlackClientError) -> Self {
        BotError::ApiError(error.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::HttpError(error.to_string())
    }
}

/// Keeps the whole context chain, outermost first.
impl From<anyhow::Error> for BotError {
    fn from(error: anyhow::Error) -> Self {
        BotError::HandlerError(format!("{error:#}"))
    }
}

impl<E> From<aws_sdk_sqs::error::SdkError<E>> for BotError
where
    E: std::fmt::Display,
{
    fn from(error: aws_sdk_sqs::error::SdkError<E>) -> Self {
        BotError::AwsError(error.to_string())
    }
}
