//! Alzheimer's mortality choropleth service.
//!
//! Loads the mortality CSV and state boundaries once at startup, then serves
//! the rendered map on `GET /` as an HTML page with the PNG inlined.

pub mod cache;
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

pub use config::{MapConfig, RenderConfig};
pub use pipeline::build_joined_table;
pub use state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>, prometheus_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        // Health check
        .route("/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
