#![recursion_limit = "256"]

use summary_bot::api::handler;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    summary_bot::setup_logging();
    lambda_runtime::run(lambda_runtime::service_fn(handler)).await
}
