//! HTTP image source backed by reqwest

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::ImageSource;
use crate::config::Config;
use crate::errors::{AcquisitionError, AppError, AppResult};
use crate::models::SourceRequest;
use crate::utils::url::UrlUtils;

/// Fetches source images over HTTP(S)
#[derive(Clone)]
pub struct HttpImageSource {
    client: Client,
    max_body_size: usize,
}

impl HttpImageSource {
    /// Build a client whose total request deadline is the configured request timeout
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.web.request_timeout,
            config.source.max_body_size,
            &config.source.user_agent,
        )
    }

    pub fn new(timeout: Duration, max_body_size: usize, user_agent: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_size,
        })
    }

    fn classify(error: reqwest::Error, url: &str) -> AcquisitionError {
        if error.is_timeout() {
            AcquisitionError::timeout(url)
        } else {
            AcquisitionError::transport(url, error.to_string())
        }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, request: &SourceRequest) -> Result<Bytes, AcquisitionError> {
        let url = request.full_url();
        let log_url = UrlUtils::obfuscate_credentials(&url);

        UrlUtils::parse_and_validate(&url).map_err(|message| AcquisitionError::InvalidUrl {
            url: log_url.clone(),
            message,
        })?;

        debug!(url = %log_url, forwarded_headers = request.headers.len(), "Downloading source image");

        let mut response = self
            .client
            .get(&url)
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| Self::classify(e, &log_url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %log_url, status = status.as_u16(), "Unexpected status code while downloading image");
            return Err(AcquisitionError::Status {
                url: log_url,
                status: status.as_u16(),
            });
        }

        let too_large = || AcquisitionError::TooLarge {
            url: log_url.clone(),
            max_size: self.max_body_size,
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_size as u64)
        {
            return Err(too_large());
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::classify(e, &log_url))?
        {
            if body.len() + chunk.len() > self.max_body_size {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %log_url, bytes = body.len(), "Downloaded source image");
        Ok(body.freeze())
    }
}
