use std::{io, sync::Arc};

use geo_client::{ClientError, GeoClient};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{AppConfig, GeoConfig},
    metrics_server,
    poller::Poller,
    registry::PrometheusRegistry,
    sources::GeoSource,
};

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("failed to build api client")]
    Client(#[source] ClientError),
    #[error("failed to get access token")]
    Authentication(#[source] ClientError),
    #[error("failed to get devices")]
    Discovery(#[source] ClientError),
    #[error("expected 1 device got {0}")]
    DeviceCount(usize),
    #[error("failed to bind metrics listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("metrics server error")]
    Server(#[source] io::Error),
}

/// Authenticate and resolve the account's single system.
///
/// The token is used for the rest of the process lifetime; there is no
/// re-authentication if it expires.
pub async fn bootstrap(client: GeoClient, cfg: &GeoConfig) -> Result<GeoSource, StartupError> {
    let token = client
        .access_token(&cfg.username, &cfg.password)
        .await
        .map_err(StartupError::Authentication)?;

    let devices = client
        .device_data(&token)
        .await
        .map_err(StartupError::Discovery)?;

    let [system] = devices.system_details.as_slice() else {
        return Err(StartupError::DeviceCount(devices.system_details.len()));
    };

    let source = GeoSource::new(client, token, system.system_id.clone());
    tracing::info!(system_id = source.system_id(), name = ?system.name, "discovered system");

    Ok(source)
}

/// Run until ctrl-c.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let shutdown = CancellationToken::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                signal.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    run_until(cfg, shutdown).await
}

/// Start polling and serve scrapes until `shutdown` is cancelled.
///
/// The metrics listener is only bound once authentication and discovery
/// have succeeded.
pub async fn run_until(cfg: AppConfig, shutdown: CancellationToken) -> Result<(), StartupError> {
    let client = GeoClient::new(&cfg.geo.base_url, cfg.geo.request_timeout()).map_err(StartupError::Client)?;
    let source = bootstrap(client, &cfg.geo).await?;

    let listener = metrics_server::bind(&cfg.metrics.bind_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: cfg.metrics.bind_addr.clone(),
            source,
        })?;

    let registry = Arc::new(PrometheusRegistry::new());
    let app = metrics_server::router(&cfg.metrics.path, registry.handle());

    let poller = Poller::new(source, registry, cfg.poller.interval);
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    let served = metrics_server::serve(listener, app, shutdown.clone()).await;

    // Stop the poller even if the server died on its own.
    shutdown.cancel();
    if let Err(e) = poller_task.await {
        tracing::error!(error = %e, "poller task failed");
    }

    served.map_err(StartupError::Server)
}
