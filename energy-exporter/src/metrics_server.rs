use std::io;

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub fn router(path: &str, handle: PrometheusHandle) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(handle)
}

pub async fn bind(bind_addr: &str) -> io::Result<TcpListener> {
    TcpListener::bind(bind_addr).await
}

/// Serve scrapes until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "serving metrics");
    }

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], handle.render())
}
