//! Centralized error handling for the image previewer
//!
//! Errors are split by layer so that each failure can be reported with
//! the right category and HTTP status at the request boundary.
//!
//! # Error Categories
//!
//! - **Application Errors**: configuration failures at startup
//! - **Preview Errors**: the per-request pipeline taxonomy (input,
//!   acquisition, transform, artifact read)
//!
//! # Usage
//!
//! ```rust
//! use image_previewer::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for request pipeline Results
pub type PreviewResult<T> = Result<T, PreviewError>;
