//! # wps-api — Axum HTTP Surface
//!
//! Serves WebP renditions of JPEG and PNG images. The first request for an
//! image transcodes it and persists the result under the cache root; later
//! requests are served from disk.
//!
//! ## Routes
//!
//! - `/health/liveness`, `/health/readiness` — probes
//! - `/metrics` — Prometheus text exposition
//! - `/{*path}` — everything else is an image request
//!
//! Static routes win over the wildcard, so an image literally named
//! `metrics` at the image root is not reachable.
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → MetricsMiddleware → Handler
//!
//! Probes and `/metrics` are mounted outside both layers.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - No cache logic in route handlers; they delegate to [`orchestration`].
//! - All errors map to HTTP responses via [`ImageError`].

pub mod error;
pub mod middleware;
pub mod orchestration;
pub mod routes;
pub mod state;

pub use error::ImageError;
pub use state::AppState;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use std::future::Future;

use wps_core::ServerConfig;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let images = routes::images::router()
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(state.metrics.clone()))
        .layer(middleware::tracing_layer::layer())
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(probes).merge(images)
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        image_root = %config.image_root.display(),
        cache_root = %config.cache_root.display(),
        allowed = %config.allowed_types,
        quality = config.quality,
        revalidate_mtime = config.revalidate_mtime,
        "WebP server listening"
    );

    let app = app(AppState::new(config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// Liveness probe. The process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Returns 200 "ready" when the image root is a readable
/// directory, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let root = state.config.image_root.clone();
    let readable = tokio::task::spawn_blocking(move || std::fs::read_dir(&root).is_ok())
        .await
        .unwrap_or(false);
    if readable {
        (StatusCode::OK, "ready").into_response()
    } else {
        tracing::warn!(
            image_root = %state.config.image_root.display(),
            "readiness check failed: image root is not a readable directory"
        );
        (StatusCode::SERVICE_UNAVAILABLE, "image root unavailable").into_response()
    }
}

/// GET /metrics: refresh pull-model gauges, then encode the registry.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    state
        .metrics
        .set_generations_in_flight(state.images.generations_in_flight());

    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}
