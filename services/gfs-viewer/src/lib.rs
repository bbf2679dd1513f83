//! GFS regional map viewer service.
//!
//! Serves an input form and renders forecast maps on request:
//!
//! - `GET /` form page
//! - `GET /map.png?date&cycle&step&parameter[&download=1]`
//! - `GET /health`, `GET /metrics` (Prometheus), `GET /api/metrics` (JSON)

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod page;
pub mod pipeline;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use pipeline::{check_map, render_map, MapRequest, RenderedMap};
pub use state::{AppState, ForecastSource};

/// Build the service router.
pub fn router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/map.png", get(handlers::map_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/metrics", get(handlers::api_metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
