//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::HeaderMap},
};
use bytes::Bytes;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use image_previewer::{
    config::Config,
    errors::AcquisitionError,
    models::SourceRequest,
    services::{FillTransform, ImageSource, PreviewService},
    web::{AppState, WebServer},
};

/// Encode a gradient test image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    bytes
}

/// Image source that serves a fixed PNG and records what was asked for
#[derive(Default)]
pub struct RecordingSource {
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl RecordingSource {
    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(_, headers)| headers.clone())
    }

    pub fn fetch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageSource for RecordingSource {
    async fn fetch(&self, request: &SourceRequest) -> Result<Bytes, AcquisitionError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.full_url(), request.headers.clone()));
        Ok(Bytes::from(png_bytes(64, 48)))
    }
}

pub fn test_config(artifact_path: &Path) -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.storage.artifact_path = artifact_path.to_path_buf();
    config.cache.capacity = 8;
    config
}

pub fn build_state(config: Config, source: Arc<dyn ImageSource>) -> AppState {
    let preview_service =
        PreviewService::new(&config, source, Arc::new(FillTransform::default()))
            .expect("Failed to build preview service");
    AppState::new(Arc::new(config), Arc::new(preview_service))
}

pub fn build_app(config: Config, source: Arc<dyn ImageSource>) -> (Router, AppState) {
    let state = build_state(config, source);
    (WebServer::create_router(state.clone()), state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, &[]).await
}
