//! Request and artifact models shared by the pipeline and the web layer

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::fmt;

use crate::cache::CacheKey;

/// Target size of a preview, both sides positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What the image source is asked to fetch
#[derive(Debug, Clone)]
pub struct SourceRequest {
    /// Absolute source URL without the query string
    pub url: String,
    /// Raw query string passed through to the origin
    pub query: Option<String>,
    /// Client headers forwarded to the origin
    pub headers: HeaderMap,
}

impl SourceRequest {
    /// Full URL including the query string
    pub fn full_url(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{}?{}", self.url, query),
            _ => self.url.clone(),
        }
    }
}

/// A validated `/fill` request
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub dimensions: Dimensions,
    pub source: SourceRequest,
}

impl PreviewRequest {
    /// Cache key of this request; the query string is part of the source identity
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(
            self.dimensions.width,
            self.dimensions.height,
            &self.source.full_url(),
        )
    }
}

/// Storage-relative name of a resized image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactHandle(String);

impl ArtifactHandle {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn file_name(&self) -> &str {
        &self.0
    }
}

impl From<&CacheKey> for ArtifactHandle {
    fn from(key: &CacheKey) -> Self {
        Self(key.as_str().to_string())
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a preview was served from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// A resized image ready to be written to the client
#[derive(Debug, Clone)]
pub struct Preview {
    pub key: CacheKey,
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub cache_status: CacheStatus,
}
