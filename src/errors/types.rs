//! Error type definitions for the image previewer
//!
//! This module defines the error hierarchy used throughout the service.
//! `AppError` covers process-level failures, while `PreviewError` is the
//! taxonomy every `/fill` request is reported with.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Failure categories of a single preview request
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Malformed width/height or missing source identifier
    #[error("Invalid request: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// The source image could not be fetched
    #[error("Failed to acquire source image: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// The fetched bytes could not be resized or the result not stored
    #[error("Failed to transform image: {0}")]
    Transform(#[from] TransformError),

    /// A cached artifact could not be read back from storage
    #[error("Failed to read stored artifact '{key}': {source}")]
    ArtifactRead {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Image source errors
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Connection or protocol failure talking to the origin
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The origin did not answer within the request deadline
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    /// The origin answered with a non-success status
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The origin body exceeded the configured limit
    #[error("Source body too large for {url}: more than {max_size} bytes")]
    TooLarge { url: String, max_size: usize },

    /// The source identifier is not a usable URL
    #[error("Invalid source URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Image transform and artifact write errors
#[derive(Error, Debug)]
pub enum TransformError {
    /// The source bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The resized image could not be encoded
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The resized artifact could not be written to storage
    #[error("Failed to store artifact '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The blocking resize worker did not complete
    #[error("Resize worker failed: {0}")]
    Worker(String),
}

/// Coarse failure category used in logs and plain-text response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    BadInput,
    UpstreamUnavailable,
    UpstreamTimeout,
    InternalFailure,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadInput => "bad input",
            Self::UpstreamUnavailable => "upstream unavailable",
            Self::UpstreamTimeout => "upstream timeout",
            Self::InternalFailure => "internal failure",
        }
    }
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl PreviewError {
    /// Create an invalid input error for a request field
    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an artifact read error
    pub fn artifact_read<K: Into<String>>(key: K, source: std::io::Error) -> Self {
        Self::ArtifactRead {
            key: key.into(),
            source,
        }
    }

    /// The failure category reported to the caller
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::InvalidInput { .. } => FailureCategory::BadInput,
            Self::Acquisition(AcquisitionError::Timeout { .. }) => FailureCategory::UpstreamTimeout,
            Self::Acquisition(AcquisitionError::InvalidUrl { .. }) => FailureCategory::BadInput,
            Self::Acquisition(_) => FailureCategory::UpstreamUnavailable,
            Self::Transform(_) | Self::ArtifactRead { .. } => FailureCategory::InternalFailure,
        }
    }

    /// Pipeline stage that produced the error, for structured logs
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "parse_input",
            Self::Acquisition(_) => "acquire",
            Self::Transform(TransformError::Storage { .. }) => "persist",
            Self::Transform(_) => "transform",
            Self::ArtifactRead { .. } => "load_artifact",
        }
    }
}

impl AcquisitionError {
    /// Create a transport error
    pub fn transport<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }
}
