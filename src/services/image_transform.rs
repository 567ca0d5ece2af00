//! Fill transform backed by the `image` crate
//!
//! The source is scaled to cover the target box and centre-cropped to it, so
//! the output always has exactly the requested dimensions.

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;

use super::traits::ImageTransform;
use crate::errors::TransformError;
use crate::models::Dimensions;

/// Scale-and-crop resizer; decoding and resampling run on the blocking pool
#[derive(Debug, Clone, Copy)]
pub struct FillTransform {
    filter: FilterType,
}

impl Default for FillTransform {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl FillTransform {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Synchronous fill, exposed for callers already off the async runtime
    pub fn fill(
        &self,
        source: &[u8],
        dimensions: Dimensions,
        format: ImageFormat,
    ) -> Result<Vec<u8>, TransformError> {
        let img =
            image::load_from_memory(source).map_err(|e| TransformError::Decode(e.to_string()))?;

        let filled = img.resize_to_fill(dimensions.width, dimensions.height, self.filter);

        // JPEG has no alpha channel
        let encodable = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(filled.to_rgb8()),
            _ => DynamicImage::ImageRgba8(filled.to_rgba8()),
        };

        let mut out = Vec::new();
        encodable
            .write_to(&mut Cursor::new(&mut out), format)
            .map_err(|e| TransformError::Encode(e.to_string()))?;
        Ok(out)
    }
}

#[async_trait]
impl ImageTransform for FillTransform {
    async fn resize(
        &self,
        source: Bytes,
        dimensions: Dimensions,
        format: ImageFormat,
    ) -> Result<Vec<u8>, TransformError> {
        let transform = *self;
        tokio::task::spawn_blocking(move || transform.fill(&source, dimensions, format))
            .await
            .map_err(|e| TransformError::Worker(e.to_string()))?
    }
}
