// Lambda bootstrap entry point for the Worker function

use lambda_runtime::{Error, run, service_fn};
use summary_bot::worker::handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    summary_bot::setup_logging();
    run(service_fn(handler)).await
}
