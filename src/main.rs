//! # Trackroom Server
//!
//! Binary entry point: telemetry, configuration, then the server itself.

use anyhow::Result;
use tracing::info;

use trackroom::config::Settings;
use trackroom::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    trackroom::telemetry::init_tracing();

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;
    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
