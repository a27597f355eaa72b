//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use map_api::{build_joined_table, router, AppState, MapConfig};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use renderer::{ChoroplethRenderer, RenderOptions};
use serde_json::Value;
use test_utils::{scenario_csv, scenario_geojson, write_temp_file};
use tower::ServiceExt;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn prometheus_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn scenario_state(cache: bool) -> Arc<AppState> {
    let csv = write_temp_file(&scenario_csv(), ".csv");
    let geojson = write_temp_file(&scenario_geojson(), ".geojson");

    let mut config = MapConfig::default();
    config.render.width = 400;
    config.render.height = 240;
    config.render.cache = cache;

    let table = build_joined_table(csv.path(), geojson.path(), &config).unwrap();
    let options = config.render_options(table.value_range()).unwrap();
    let renderer = ChoroplethRenderer::new(options).unwrap();
    Arc::new(AppState::new(table, renderer, cache))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

fn embedded_png(html: &str) -> Vec<u8> {
    let marker = "data:image/png;base64,";
    let start = html.find(marker).expect("page has no data URI") + marker.len();
    let end = start + html[start..].find('"').unwrap();
    STANDARD.decode(&html[start..end]).unwrap()
}

// ============================================================================
// GET /
// ============================================================================

#[tokio::test]
async fn test_index_serves_page_with_inline_png() {
    let app = router(scenario_state(false), prometheus_handle());
    let (status, content_type, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<title>Percent Change in Alzheimer&#39;s Fatalities (2014-2019)</title>"));

    let png = embedded_png(&html);
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    // IHDR width and height
    assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 400);
    assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 240);
}

#[tokio::test]
async fn test_index_is_stable_across_requests() {
    let state = scenario_state(false);
    let (_, _, first) = get(router(Arc::clone(&state), prometheus_handle()), "/").await;
    let (_, _, second) = get(router(state, prometheus_handle()), "/").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cache_stores_rendered_image() {
    let state = scenario_state(true);
    let cache = state.cache.as_ref().unwrap();
    assert!(cache.get(state.fingerprint).await.is_none());

    let (status, _, first) = get(router(Arc::clone(&state), prometheus_handle()), "/").await;
    assert_eq!(status, StatusCode::OK);

    let cached = cache.get(state.fingerprint).await.unwrap();
    let html = String::from_utf8(first.clone()).unwrap();
    assert_eq!(STANDARD.decode(cached.as_bytes()).unwrap(), embedded_png(&html));

    let (_, _, second) = get(router(Arc::clone(&state), prometheus_handle()), "/").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_table_still_serves_a_map() {
    let renderer = ChoroplethRenderer::new(
        MapConfig::default().render_options(None).unwrap(),
    )
    .unwrap();
    let state = Arc::new(AppState::new(Default::default(), renderer, false));
    let (status, _, body) = get(router(state, prometheus_handle()), "/").await;

    assert_eq!(status, StatusCode::OK);
    let png = embedded_png(&String::from_utf8(body).unwrap());
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
}

#[tokio::test]
async fn test_render_failure_returns_500_and_counts_error() {
    // Only this test installs the global recorder; the others use detached handles.
    let handle = PrometheusBuilder::new().install_recorder().unwrap();

    // Passes layout validation but is too wide for a pixmap allocation
    let renderer = ChoroplethRenderer::new(RenderOptions {
        width: 600_000_000,
        height: 40,
        ..RenderOptions::default()
    })
    .unwrap();
    let state = Arc::new(AppState::new(Default::default(), renderer, true));
    let (status, _, body) = get(router(Arc::clone(&state), handle.clone()), "/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"Failed to render map");
    assert!(state.cache.as_ref().unwrap().get(state.fingerprint).await.is_none());

    let exposition = handle.render();
    assert!(
        exposition.contains(r#"map_render_errors_total{kind="render"} 1"#),
        "{}",
        exposition
    );
}

// ============================================================================
// Health, readiness, metrics
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = router(scenario_state(false), prometheus_handle());
    let (status, _, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_joined_states() {
    let app = router(scenario_state(false), prometheus_handle());
    let (status, _, body) = get(app, "/ready").await;
    assert_eq!(status, StatusCode::OK);

    // Ohio, Texas and Nevada survive the join and filters
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ready"], true);
    assert_eq!(json["states"], 3);
    assert_eq!(json["empty"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_is_plain_text() {
    let app = router(scenario_state(false), prometheus_handle());
    let (status, content_type, _) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = router(scenario_state(false), prometheus_handle());
    let (status, _, _) = get(app, "/map.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
