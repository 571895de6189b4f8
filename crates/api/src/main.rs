//! Blobmeter console simulator
//!
//! Interactive menu that sends simulated PUT and GET requests to two fake
//! storage providers and prints the counters they produce.

use std::sync::Arc;

use anyhow::Context;
use blobmeter_app::{console, AppContext, SimulationSettings, Simulator};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = blobmeter_infra::config::load().context("failed to load configuration")?;

    // Initialize logging FIRST so context construction is visible
    blobmeter_infra::logging::init(&config.logging).context("failed to initialize logging")?;

    let context =
        Arc::new(AppContext::new_with_config(config).context("failed to build meter context")?);
    let simulator = Simulator::new(Arc::clone(&context), SimulationSettings::default());

    info!("blobmeter simulator starting");
    console::run(&simulator, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("console i/o failed")?;

    context.shutdown();
    Ok(())
}
