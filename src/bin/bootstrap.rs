// Lambda bootstrap entry point for recap runs

use lambda_runtime::{Error, run, service_fn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    recap::setup_logging();

    run(service_fn(recap::worker::handler)).await
}
