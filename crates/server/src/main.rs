mod bootstrap;
mod preflight;

use anyhow::Result;
use relay_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use relay_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // The relay refuses to start without its external tooling in place;
    // once the event loop is running no single event can take it down.
    preflight::run(&config).await?;

    let app = bootstrap::bootstrap_with_config(config);

    tracing::info!(
        transport_mode = if app.slack_runner.is_noop_transport() { "noop" } else { "socket" },
        notify_channel = %app.config.notify_channel,
        projects = app.config.projects.len(),
        "slack runner transport mode initialized"
    );

    app.slack_runner.start().await?;

    tracing::info!("release relay started");
    wait_for_shutdown().await?;
    tracing::info!("release relay stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
