//! Preview pipeline services
//!
//! - [`PreviewService`] orchestrates cache lookup and the miss pipeline
//! - [`HttpImageSource`] fetches source images
//! - [`FillTransform`] resizes them
//! - [`ArtifactStorage`] persists the results

pub mod artifact_storage;
pub mod image_source;
pub mod image_transform;
pub mod inflight;
pub mod preview_service;
pub mod traits;

pub use artifact_storage::ArtifactStorage;
pub use image_source::HttpImageSource;
pub use image_transform::FillTransform;
pub use inflight::{InflightGuard, InflightRequests};
pub use preview_service::PreviewService;
pub use traits::{ImageSource, ImageTransform};
