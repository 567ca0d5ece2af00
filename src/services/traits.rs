//! Seams between the preview pipeline and its external collaborators
//!
//! The orchestrator only depends on these traits, so the HTTP fetcher and the
//! image resampler can be swapped (or mocked in tests) without touching the
//! cache logic.

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;

use crate::errors::{AcquisitionError, TransformError};
use crate::models::{Dimensions, SourceRequest};

/// Fetches the raw bytes of a source image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the image described by `request`.
    ///
    /// Transport failures, timeouts and non-success statuses are reported as
    /// [`AcquisitionError`]; implementations never retry on their own.
    async fn fetch(&self, request: &SourceRequest) -> Result<Bytes, AcquisitionError>;
}

/// Resizes raw image bytes to the requested dimensions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageTransform: Send + Sync {
    /// Decode `source`, fill `dimensions` and encode the result as `format`
    async fn resize(
        &self,
        source: Bytes,
        dimensions: Dimensions,
        format: ImageFormat,
    ) -> Result<Vec<u8>, TransformError>;
}
