//! Prometheus metrics recorded by the handlers.

use std::time::Duration;

use map_common::MapError;
use metrics::{counter, histogram};

pub fn record_request() {
    counter!("map_requests_total").increment(1);
}

pub fn record_cache_hit() {
    counter!("map_render_cache_hits_total").increment(1);
}

pub fn record_render(elapsed: Duration) {
    counter!("map_renders_total").increment(1);
    histogram!("map_render_duration_seconds").record(elapsed.as_secs_f64());
}

/// Render failures, labelled by error kind. A panicked render task counts as `task`.
pub fn record_render_error(error: Option<&MapError>) {
    let kind = error.map(MapError::kind).unwrap_or("task");
    counter!("map_render_errors_total", "kind" => kind).increment(1);
}
