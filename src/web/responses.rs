//! HTTP response types and utilities
//!
//! JSON endpoints share the [`ApiResponse`] envelope. Preview responses are
//! raw image bytes on success and plain text on failure.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{AcquisitionError, PreviewError};
use crate::models::Preview;

/// Cache lifetime advertised for served previews
pub const PREVIEW_CACHE_CONTROL: &str = "public, max-age=86400";

/// Header reporting whether a preview came from the cache
pub const X_CACHE: &str = "x-cache";

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub cache: CacheHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub len: usize,
    pub capacity: usize,
}

impl HealthResponse {
    pub fn healthy(uptime_seconds: i64, cache: CacheHealth) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
            cache,
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

pub fn service_unavailable(message: impl Into<String>) -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::<()>::error(message.into())),
    )
}

impl PreviewError {
    /// HTTP status reported for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Acquisition(AcquisitionError::InvalidUrl { .. }) => StatusCode::BAD_REQUEST,
            Self::Acquisition(AcquisitionError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Acquisition(_) => StatusCode::BAD_GATEWAY,
            Self::Transform(_) | Self::ArtifactRead { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let body = format!("{}: {}", self.category().as_str(), self);
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

impl IntoResponse for Preview {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.bytes).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(PREVIEW_CACHE_CONTROL));
        headers.insert(X_CACHE, HeaderValue::from_static(self.cache_status.as_str()));
        response
    }
}
