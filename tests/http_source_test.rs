//! End-to-end tests against a local upstream through the real HTTP source

mod common;

use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get as get_route,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use common::{build_app, get, png_bytes, send, test_config};
use image_previewer::{config::Config, services::HttpImageSource};

async fn serve_png() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], png_bytes(320, 240))
}

async fn serve_slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    ([(header::CONTENT_TYPE, "image/png")], png_bytes(8, 8))
}

async fn serve_private(headers: HeaderMap) -> axum::response::Response {
    match headers.get(header::AUTHORIZATION) {
        Some(value) if value == "Bearer letmein" => serve_png().await.into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn serve_garbage() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], "this is not an image")
}

async fn start_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/pic.png", get_route(serve_png))
        .route("/slow.png", get_route(serve_slow))
        .route("/private.png", get_route(serve_private))
        .route("/garbage.png", get_route(serve_garbage));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn app_with_http_source(config: Config) -> (Router, image_previewer::web::AppState) {
    let source = HttpImageSource::from_config(&config).unwrap();
    build_app(config, Arc::new(source))
}

#[tokio::test]
async fn test_fetches_and_resizes_from_upstream() {
    let upstream = start_upstream().await;
    let dir = TempDir::new().unwrap();
    let (app, state) = app_with_http_source(test_config(dir.path()));

    let uri = format!("/fill/100/50/http://{upstream}/pic.png");
    let response = get(&app, &uri).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "image/png");
    let decoded = image::load_from_memory(&response.body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 50));
    assert_eq!(state.preview_service.cache().len(), 1);
}

#[tokio::test]
async fn test_upstream_error_status_is_bad_gateway() {
    let upstream = start_upstream().await;
    let dir = TempDir::new().unwrap();
    let (app, state) = app_with_http_source(test_config(dir.path()));

    let response = get(&app, &format!("/fill/100/50/http://{upstream}/missing.png")).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.text().starts_with("upstream unavailable"));
    assert!(response.text().contains("404"));
    assert!(state.preview_service.cache().is_empty());
}

#[tokio::test]
async fn test_unreachable_source_is_bad_gateway() {
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let dir = TempDir::new().unwrap();
    let (app, state) = app_with_http_source(test_config(dir.path()));

    let response = get(&app, &format!("/fill/300/200/http://{closed}/pic.jpg")).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(state.preview_service.cache().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_slow_upstream_is_gateway_timeout() {
    let upstream = start_upstream().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.web.request_timeout = Duration::from_millis(200);
    let (app, state) = app_with_http_source(config);

    let response = get(&app, &format!("/fill/10/10/http://{upstream}/slow.png")).await;

    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    assert!(response.text().starts_with("upstream timeout"));
    assert!(state.preview_service.cache().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let upstream = start_upstream().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.source.max_body_size = 64;
    let (app, state) = app_with_http_source(config);

    let response = get(&app, &format!("/fill/10/10/http://{upstream}/pic.png")).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.text().contains("too large"));
    assert!(state.preview_service.cache().is_empty());
}

#[tokio::test]
async fn test_undecodable_source_is_internal_error() {
    let upstream = start_upstream().await;
    let dir = TempDir::new().unwrap();
    let (app, state) = app_with_http_source(test_config(dir.path()));

    let response = get(&app, &format!("/fill/10/10/http://{upstream}/garbage.png")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().starts_with("internal failure"));
    assert!(state.preview_service.cache().is_empty());
}

#[tokio::test]
async fn test_authorization_header_reaches_upstream() {
    let upstream = start_upstream().await;
    let dir = TempDir::new().unwrap();
    let (app, _state) = app_with_http_source(test_config(dir.path()));
    let uri = format!("/fill/20/20/http://{upstream}/private.png");

    let denied = get(&app, &uri).await;
    assert_eq!(denied.status, StatusCode::BAD_GATEWAY);

    let allowed = send(
        &app,
        axum::http::Method::GET,
        &uri,
        &[("authorization", "Bearer letmein")],
    )
    .await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.headers["x-cache"], "MISS");
}
