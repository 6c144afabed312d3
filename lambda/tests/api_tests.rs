use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};

use summary_bot::api::handler::route_request;
use summary_bot::api::signature::compute_signature;
use summary_bot::api::slash_handler::build_slash_task;
use summary_bot::api::view_submission::build_task_from_view;
use summary_bot::core::config::{AppConfig, NotionConfig};
use summary_bot::core::models::{ConversationScope, InteractionTask, MAX_MESSAGE_COUNT};
use summary_bot::slack::command_parser::parse_form_data;

const SECRET: &str = "test-signing-secret";

fn config() -> AppConfig {
    AppConfig {
        processing_queue_url: "https://sqs.invalid/queue".into(),
        slack_signing_secret: SECRET.into(),
        slack_bot_token: "xoxb-test".into(),
        completion_api_key: "key".into(),
        completion_base_url: "https://llm.invalid/v1".into(),
        completion_model: "model".into(),
        completion_timeout_secs: 5,
        notion: NotionConfig::default(),
        export_timezone: chrono_tz::Tz::UTC,
    }
}

fn now() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string()
}

fn request(body: &str, signature: &str, timestamp: &str) -> Value {
    json!({
        "headers": {
            "x-slack-signature": signature,
            "x-slack-request-timestamp": timestamp
        },
        "body": body,
        "isBase64Encoded": false
    })
}

fn body_of(response: &Value) -> Value {
    serde_json::from_str(response["body"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn unsigned_requests_are_rejected() {
    let response = route_request(&config(), &request("text=1", "v0=deadbeef", &now())).await;
    assert_eq!(response["statusCode"], 401);

    let response = route_request(&config(), &json!({ "headers": {}, "body": "text=" })).await;
    assert_eq!(response["statusCode"], 401);
}

#[tokio::test]
async fn help_is_answered_inline() {
    let body = "command=%2Fsummarize&text=help&channel_id=C1&user_id=U1";
    let ts = now();
    let sig = compute_signature(&ts, body, SECRET);

    let response = route_request(&config(), &request(body, &sig, &ts)).await;

    assert_eq!(response["statusCode"], 200);
    let reply = body_of(&response);
    assert_eq!(reply["response_type"], "ephemeral");
    assert!(reply["text"].as_str().unwrap().contains("/summarize N"));
}

#[tokio::test]
async fn unknown_interactive_types_are_acked() {
    let body = format!(
        "payload={}",
        urlencode(&json!({ "type": "block_suggestion" }).to_string())
    );
    let ts = now();
    let sig = compute_signature(&ts, &body, SECRET);

    let response = route_request(&config(), &request(&body, &sig, &ts)).await;
    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["body"], "{}");
}

fn urlencode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[test]
fn slash_command_becomes_clamped_channel_task() {
    let event = parse_form_data(
        "channel_id=C1&user_id=U1&command=%2Fsummarize&text=5000&\
         response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2F1",
    )
    .unwrap();

    let task = build_slash_task(&event, "cid".into()).unwrap();
    assert_eq!(
        task,
        InteractionTask::Summarize {
            correlation_id: "cid".into(),
            user_id: "U1".into(),
            scope: ConversationScope::Channel {
                channel_id: "C1".into(),
                message_count: MAX_MESSAGE_COUNT,
            },
            response_url: Some("https://hooks.slack.com/commands/1".into()),
        }
    );

    let help = parse_form_data("channel_id=C1&user_id=U1&text=help").unwrap();
    assert!(build_slash_task(&help, "cid".into()).is_none());
}

#[test]
fn channel_picker_submission_becomes_task() {
    let view = json!({
        "callback_id": "channel_select_modal",
        "state": { "values": {
            "channel_select_block": { "channel_select": { "type": "channels_select", "selected_channel": "C7" } },
            "message_count_block": { "message_count": { "type": "number_input", "value": "0" } }
        }}
    });
    let payload = json!({ "type": "view_submission", "user": { "id": "U1" }, "view": view });

    let task = build_task_from_view(&payload, &view, "cid".into()).unwrap();
    let InteractionTask::Summarize { user_id, scope, .. } = task else {
        panic!("expected summarize task");
    };
    assert_eq!(user_id, "U1");
    assert_eq!(
        scope,
        ConversationScope::Channel {
            channel_id: "C7".into(),
            message_count: 100
        }
    );
}
