//! API Lambda handler - thin router that delegates to specialized handlers.
//!
//! This module handles:
//! - Request validation (headers, body, signature)
//! - Interactive components (delegated to `interactive_handler` module)
//! - Slash commands (delegated to `slash_handler` module)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use tracing::{error, info};

use super::{helpers, interactive_handler, parsing, signature, slash_handler};
use crate::core::config::AppConfig;

pub use self::function_handler as handler;

/// Lambda handler for the API entrypoint.
///
/// Routes requests to specialized handlers based on payload type.
///
/// # Errors
///
/// Returns an error only when configuration cannot be loaded. Malformed or
/// unsigned requests get an error response payload with a 4xx status.
#[tracing::instrument(level = "info", skip(event))]
pub async fn function_handler(
    event: LambdaEvent<serde_json::Value>,
) -> Result<impl Serialize, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    Ok(route_request(&config, &event.payload).await)
}

/// Validate and route one API Gateway request.
pub async fn route_request(config: &AppConfig, payload: &Value) -> Value {
    // ========================================================================
    // Extract and validate headers
    // ========================================================================

    let Some(headers) = payload.get("headers") else {
        error!("Request missing headers");
        return helpers::err_response(400, "Missing headers");
    };

    let body = match extract_body(payload) {
        Ok(b) => b,
        Err(response) => return response,
    };

    // ========================================================================
    // Verify Slack signature
    // ========================================================================

    if let Err(response) = verify_signature(&body, headers, config) {
        return response;
    }

    info!("Slack signature verified successfully");

    // ========================================================================
    // Route to specialized handlers
    // ========================================================================

    // Interactive components (form-encoded with payload=)
    if parsing::is_interactive_body(&body) {
        let payload = match parsing::parse_interactive_payload(&body) {
            Ok(v) => v,
            Err(e) => {
                error!("Interactive payload parse error: {}", e);
                return helpers::err_response(400, &format!("Parse Error: {e}"));
            }
        };

        return interactive_handler::handle_interactive(config, &payload).await;
    }

    // Slash command (form-encoded)
    match slash_handler::handle_slash_command(config, &body).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to parse Slack event: {}", e);
            helpers::err_response(400, &format!("Parse Error: {e}"))
        }
    }
}

// ============================================================================
// Request Validation Helpers
// ============================================================================

/// The raw request body, base64-decoded when API Gateway encoded it.
/// The signature is computed over these exact bytes.
fn extract_body(payload: &Value) -> Result<Cow<'_, str>, Value> {
    let Some(body) = payload.get("body") else {
        error!("Request missing body");
        return Err(helpers::err_response(400, "Missing body"));
    };

    let Some(body_str) = body.as_str() else {
        error!("Request body is not a string");
        return Err(helpers::err_response(400, "Invalid body format"));
    };

    let encoded = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(Cow::Borrowed(body_str));
    }

    STANDARD
        .decode(body_str)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map(Cow::Owned)
        .ok_or_else(|| {
            error!("Request body is not valid base64 UTF-8");
            helpers::err_response(400, "Invalid body encoding")
        })
}

fn verify_signature(body: &str, headers: &Value, config: &AppConfig) -> Result<(), Value> {
    let Some(sig) = parsing::get_header_value(headers, "X-Slack-Signature") else {
        error!("Missing X-Slack-Signature header");
        return Err(helpers::err_response(
            401,
            "Missing X-Slack-Signature header",
        ));
    };

    let Some(timestamp) = parsing::get_header_value(headers, "X-Slack-Request-Timestamp") else {
        error!("Missing X-Slack-Request-Timestamp header");
        return Err(helpers::err_response(
            401,
            "Missing X-Slack-Request-Timestamp header",
        ));
    };

    if !signature::verify_slack_signature(body, timestamp, sig, &config.slack_signing_secret) {
        error!("Slack signature verification failed");
        return Err(helpers::err_response(401, "Invalid Slack signature"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_body_is_borrowed() {
        let payload = json!({ "body": "text=42", "isBase64Encoded": false });
        assert_eq!(extract_body(&payload).unwrap(), "text=42");
    }

    #[test]
    fn base64_body_is_decoded() {
        let payload = json!({ "body": STANDARD.encode("text=42"), "isBase64Encoded": true });
        assert_eq!(extract_body(&payload).unwrap(), "text=42");
    }

    #[test]
    fn missing_or_invalid_body_is_rejected() {
        let missing = extract_body(&json!({})).unwrap_err();
        assert_eq!(missing["statusCode"], 400);

        let bad = extract_body(&json!({ "body": "%%%", "isBase64Encoded": true })).unwrap_err();
        assert_eq!(bad["statusCode"], 400);
    }
}
