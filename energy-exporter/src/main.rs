use std::process::ExitCode;

use anyhow::{Context, Result};
use energy_exporter::{app, config::AppConfig, observability};

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let chain = format!("{e:#}");
            tracing::error!(error = %chain, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = AppConfig::load().context("failed to parse config")?;
    tracing::info!(
        geo = ?cfg.geo,
        poll_interval = ?cfg.poller.interval,
        metrics_addr = %cfg.metrics.bind_addr,
        "configuration loaded"
    );

    app::run(cfg).await?;
    Ok(())
}
