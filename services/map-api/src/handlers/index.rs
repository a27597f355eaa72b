//! GET / - the choropleth page.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, error};

use crate::metrics;
use crate::page::render_page;
use crate::state::AppState;

pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    metrics::record_request();

    if let Some(cache) = &state.cache {
        if let Some(image) = cache.get(state.fingerprint).await {
            metrics::record_cache_hit();
            debug!("Serving cached map");
            return Html(render_page(state.title(), &image)).into_response();
        }
    }

    let start = Instant::now();
    let table = Arc::clone(&state.table);
    let renderer = Arc::clone(&state.renderer);
    let result = tokio::task::spawn_blocking(move || renderer.render_base64(&table)).await;

    let image = match result {
        Ok(Ok(image)) => Arc::new(image),
        Ok(Err(e)) => {
            error!(error = %e, kind = e.kind(), "Map rendering failed");
            metrics::record_render_error(Some(&e));
            return render_failed();
        }
        Err(e) => {
            error!(error = %e, "Render task failed");
            metrics::record_render_error(None);
            return render_failed();
        }
    };
    metrics::record_render(start.elapsed());

    if let Some(cache) = &state.cache {
        cache.insert(state.fingerprint, Arc::clone(&image)).await;
    }

    Html(render_page(state.title(), &image)).into_response()
}

fn render_failed() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render map").into_response()
}
