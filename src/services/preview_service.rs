//! Preview orchestration
//!
//! Validates a `/fill` request, consults the LRU cache and on a miss runs the
//! fetch → resize → persist pipeline before serving the stored artifact.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::ImageFormat;
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

use super::artifact_storage::ArtifactStorage;
use super::inflight::InflightRequests;
use super::traits::{ImageSource, ImageTransform};
use crate::cache::{CacheKey, CacheStats, LruCache};
use crate::config::Config;
use crate::errors::{AcquisitionError, AppResult, PreviewError, PreviewResult};
use crate::models::{
    ArtifactHandle, CacheStatus, Dimensions, Preview, PreviewRequest, SourceRequest,
};
use crate::utils::url::UrlUtils;

pub struct PreviewService {
    cache: Arc<LruCache<CacheKey, ArtifactHandle>>,
    source: Arc<dyn ImageSource>,
    transform: Arc<dyn ImageTransform>,
    storage: ArtifactStorage,
    inflight: Option<Arc<InflightRequests>>,
    request_timeout: Duration,
    max_dimension: u32,
}

impl std::fmt::Debug for PreviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewService")
            .field("cache", &self.cache)
            .field("storage", &self.storage)
            .field("coalesce_requests", &self.inflight.is_some())
            .field("request_timeout", &self.request_timeout)
            .field("max_dimension", &self.max_dimension)
            .finish()
    }
}

impl PreviewService {
    pub fn new(
        config: &Config,
        source: Arc<dyn ImageSource>,
        transform: Arc<dyn ImageTransform>,
    ) -> AppResult<Self> {
        let cache = Arc::new(LruCache::new(config.cache_capacity()?));
        let inflight = config
            .cache
            .coalesce_requests
            .then(|| Arc::new(InflightRequests::new()));

        Ok(Self {
            cache,
            source,
            transform,
            storage: ArtifactStorage::new(&config.storage.artifact_path),
            inflight,
            request_timeout: config.web.request_timeout,
            max_dimension: config.transform.max_dimension,
        })
    }

    pub fn cache(&self) -> &Arc<LruCache<CacheKey, ArtifactHandle>> {
        &self.cache
    }

    pub fn storage(&self) -> &ArtifactStorage {
        &self.storage
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cache entry. Stored artifacts stay on disk and are
    /// overwritten when the key is populated again.
    pub fn clear_cache(&self) -> usize {
        let cleared = self.cache.clear();
        info!(cleared, "Preview cache cleared");
        cleared
    }

    /// Validate raw path segments into a [`PreviewRequest`]
    pub fn parse_request(
        &self,
        width: &str,
        height: &str,
        source: &str,
        query: Option<&str>,
        headers: HeaderMap,
    ) -> PreviewResult<PreviewRequest> {
        let width = self.parse_dimension("width", width)?;
        let height = self.parse_dimension("height", height)?;

        let source = source.trim();
        if source.trim_start_matches('/').is_empty() {
            return Err(PreviewError::invalid_input("url", "source image url is missing"));
        }

        let url = UrlUtils::normalize_scheme(source);
        UrlUtils::parse_and_validate(&url)
            .map_err(|message| PreviewError::invalid_input("url", message))?;

        Ok(PreviewRequest {
            dimensions: Dimensions::new(width, height),
            source: SourceRequest {
                url,
                query: query.filter(|q| !q.is_empty()).map(str::to_string),
                headers,
            },
        })
    }

    fn parse_dimension(&self, field: &str, raw: &str) -> PreviewResult<u32> {
        let value: u32 = raw
            .parse()
            .map_err(|_| PreviewError::invalid_input(field, format!("'{raw}' is not a positive integer")))?;

        if value == 0 {
            return Err(PreviewError::invalid_input(field, "must be greater than zero"));
        }
        if value > self.max_dimension {
            return Err(PreviewError::invalid_input(
                field,
                format!("{value} exceeds the maximum of {}", self.max_dimension),
            ));
        }
        Ok(value)
    }

    /// Serve a preview, populating the cache on a miss
    pub async fn preview(&self, request: PreviewRequest) -> PreviewResult<Preview> {
        let key = request.cache_key();

        let result = self.resolve(&request, &key).await;
        match &result {
            Ok(preview) => debug!(
                key = %key,
                cache = preview.cache_status.as_str(),
                bytes = preview.bytes.len(),
                "Preview served"
            ),
            Err(e) => warn!(
                key = %key,
                stage = e.stage(),
                category = e.category().as_str(),
                error = %e,
                "Preview request failed"
            ),
        }
        result
    }

    async fn resolve(&self, request: &PreviewRequest, key: &CacheKey) -> PreviewResult<Preview> {
        if let Some(handle) = self.cache.get(key) {
            return self.load(key, &handle, CacheStatus::Hit).await;
        }

        let _inflight = match &self.inflight {
            Some(inflight) => {
                let guard = inflight.acquire(key).await;
                // Another request may have populated the key while we waited
                if let Some(handle) = self.cache.get(key) {
                    return self.load(key, &handle, CacheStatus::Hit).await;
                }
                Some(guard)
            }
            None => None,
        };

        let handle = self.populate(request, key).await?;
        self.load(key, &handle, CacheStatus::Miss).await
    }

    async fn populate(&self, request: &PreviewRequest, key: &CacheKey) -> PreviewResult<ArtifactHandle> {
        let source = self.acquire(request).await?;
        debug!(key = %key, bytes = source.len(), "Source image acquired");

        let format = output_format(key);
        let resized = self
            .transform
            .resize(source, request.dimensions, format)
            .await?;

        let handle = self.storage.store(key, &resized).await?;
        let updated = self.cache.set(key.clone(), handle.clone());
        info!(
            key = %key,
            dimensions = %request.dimensions,
            bytes = resized.len(),
            updated,
            "Preview cached"
        );
        Ok(handle)
    }

    /// Fetch the source image. Only acquisition is bounded by the request
    /// deadline; resize and persist run to completion once started.
    async fn acquire(&self, request: &PreviewRequest) -> PreviewResult<Bytes> {
        match tokio::time::timeout(self.request_timeout, self.source.fetch(&request.source)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AcquisitionError::timeout(UrlUtils::obfuscate_credentials(
                &request.source.full_url(),
            ))
            .into()),
        }
    }

    async fn load(
        &self,
        key: &CacheKey,
        handle: &ArtifactHandle,
        cache_status: CacheStatus,
    ) -> PreviewResult<Preview> {
        let bytes: Bytes = self
            .storage
            .load(handle)
            .await
            .map_err(|e| PreviewError::artifact_read(key.as_str(), e))?;

        Ok(Preview {
            key: key.clone(),
            bytes,
            content_type: output_format(key).to_mime_type(),
            cache_status,
        })
    }
}

/// Encoding of the stored artifact, taken from the key extension
fn output_format(key: &CacheKey) -> ImageFormat {
    ImageFormat::from_extension(key.extension()).unwrap_or(ImageFormat::Jpeg)
}
