//! URL utilities for consistent source URL handling
//!
//! This module provides the scheme defaulting applied to source identifiers
//! taken from the request path, plus validation and log-safe rendering.

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Normalize a source identifier into an absolute URL
    ///
    /// Identifiers without an `http://` or `https://` scheme default to
    /// `https://`. A scheme whose double slash was collapsed to one by an
    /// intermediary (`https:/host/...`) is repaired.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use image_previewer::utils::url::UrlUtils;
    ///
    /// assert_eq!(UrlUtils::normalize_scheme("example.com/a.jpg"), "https://example.com/a.jpg");
    /// assert_eq!(UrlUtils::normalize_scheme("http://example.com"), "http://example.com");
    /// assert_eq!(UrlUtils::normalize_scheme("https:/example.com"), "https://example.com");
    /// ```
    pub fn normalize_scheme(source: &str) -> String {
        let trimmed = source.trim().trim_start_matches('/');

        for scheme in ["https:", "http:"] {
            if let Some(rest) = strip_prefix_ignore_case(trimmed, scheme) {
                return format!("{}//{}", scheme, rest.trim_start_matches('/'));
            }
        }

        format!("https://{trimmed}")
    }

    /// Parse and validate a URL, requiring an HTTP(S) scheme and a host
    pub fn parse_and_validate(url: &str) -> Result<Url, String> {
        let parsed = Url::parse(url).map_err(|e| e.to_string())?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme '{}'", parsed.scheme()));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err("missing host".to_string());
        }
        Ok(parsed)
    }

    /// Hide user credentials embedded in a URL before it is logged
    pub fn obfuscate_credentials(url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
                let mut hidden = parsed.clone();
                let _ = hidden.set_username("****");
                let _ = hidden.set_password(Some("****"));
                hidden.to_string()
            }
            _ => url.to_string(),
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}
