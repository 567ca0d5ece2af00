//! Deterministic cache key derivation
//!
//! A key is `"{width}_{height}_{source}"` with a canonical image suffix
//! appended when the source has none, and every path separator replaced by
//! `_`. The key doubles as the artifact's file name in storage.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Extensions accepted as an image suffix, compared case-insensitively
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Suffix appended when the source identifier lacks a recognized extension
pub const CANONICAL_EXTENSION: &str = "jpg";

const PATH_SEPARATORS: &[char] = &['/', '\\'];
const SEPARATOR_SUBSTITUTE: char = '_';

// Common filesystems cap a name at 255 bytes.
const MAX_KEY_LEN: usize = 200;
const SHORTENED_PREFIX_LEN: usize = 120;

/// Filesystem-safe name for a (width, height, source) triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a resize of `source` to `width`×`height`.
    ///
    /// Dimensions are assumed valid; the caller rejects zero sizes.
    ///
    /// The mapping is not injective. A source without a recognized extension
    /// shares its key with the same source ending in `.jpg`, and sources that
    /// differ only by `/`, `\` or `_` collapse to one key, so such sources
    /// share a cache entry and an artifact.
    pub fn derive(width: u32, height: u32, source: &str) -> Self {
        let mut name = format!("{width}_{height}_{source}");
        if recognized_extension(source).is_none() {
            name.push('.');
            name.push_str(CANONICAL_EXTENSION);
        }

        let escaped: String = name
            .chars()
            .map(|c| {
                if PATH_SEPARATORS.contains(&c) {
                    SEPARATOR_SUBSTITUTE
                } else {
                    c
                }
            })
            .collect();

        if escaped.len() > MAX_KEY_LEN {
            Self(shorten(&escaped))
        } else {
            Self(escaped)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased image extension of the key
    pub fn extension(&self) -> &'static str {
        recognized_extension(&self.0).unwrap_or(CANONICAL_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The recognized extension `value` ends with, if any
fn recognized_extension(value: &str) -> Option<&'static str> {
    let (_, ext) = value.rsplit_once('.')?;
    if ext.contains(PATH_SEPARATORS) {
        return None;
    }
    RECOGNIZED_EXTENSIONS
        .iter()
        .copied()
        .find(|known| ext.eq_ignore_ascii_case(known))
}

/// Keep a readable prefix and make the name unique with a digest of the full key
fn shorten(key: &str) -> String {
    let mut cut = SHORTENED_PREFIX_LEN;
    while !key.is_char_boundary(cut) {
        cut -= 1;
    }
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    let ext = recognized_extension(key).unwrap_or(CANONICAL_EXTENSION);
    format!("{}_{digest}.{ext}", &key[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://h.example/a", "https://h.example/a.jpg")]
    #[case("https://h.example/a/b.png", "https://h.example/a_b.png")]
    #[case("https://h.example\\a.png", "https://h.example/a.png")]
    fn test_known_aliases_share_a_key(#[case] left: &str, #[case] right: &str) {
        assert_eq!(CacheKey::derive(64, 64, left), CacheKey::derive(64, 64, right));
    }

    #[rstest]
    #[case(
        300,
        200,
        "https://raw.githubusercontent.com/_gopher_original_1024x504.jpg",
        "300_200_https:__raw.githubusercontent.com__gopher_original_1024x504.jpg"
    )]
    #[case(300, 200, "https://raw.example.com/pic.jpg", "300_200_https:__raw.example.com_pic.jpg")]
    #[case(50, 50, "https://host/image", "50_50_https:__host_image.jpg")]
    #[case(50, 50, "https://host/logo.PNG", "50_50_https:__host_logo.PNG")]
    #[case(10, 20, "https://host/a.webp?v=2", "10_20_https:__host_a.webp?v=2.jpg")]
    #[case(10, 20, "https://host/dir.png/file", "10_20_https:__host_dir.png_file.jpg")]
    #[case(10, 20, "https://host\\win\\pic.gif", "10_20_https:__host_win_pic.gif")]
    fn test_derive(
        #[case] width: u32,
        #[case] height: u32,
        #[case] source: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(CacheKey::derive(width, height, source).as_str(), expected);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let first = CacheKey::derive(300, 200, "https://host/img.jpg");
        for _ in 0..10 {
            assert_eq!(CacheKey::derive(300, 200, "https://host/img.jpg"), first);
        }
    }

    #[test]
    fn test_distinct_inputs_give_distinct_keys() {
        let a = CacheKey::derive(300, 200, "https://host/img.jpg");
        let b = CacheKey::derive(200, 300, "https://host/img.jpg");
        let c = CacheKey::derive(300, 200, "https://host/img2.jpg");
        let d = CacheKey::derive(30, 200, "https://host/img.jpg");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_extension() {
        assert_eq!(CacheKey::derive(1, 1, "https://h/a.PNG").extension(), "png");
        assert_eq!(CacheKey::derive(1, 1, "https://h/a").extension(), "jpg");
    }

    #[test]
    fn test_long_keys_are_shortened_and_unique() {
        let long_a = format!("https://host/{}.png", "a".repeat(400));
        let long_b = format!("https://host/{}b.png", "a".repeat(399));

        let a = CacheKey::derive(100, 100, &long_a);
        let b = CacheKey::derive(100, 100, &long_b);

        assert!(a.as_str().len() <= MAX_KEY_LEN);
        assert!(a.as_str().starts_with("100_100_https:__host_aaa"));
        assert!(a.as_str().ends_with(".png"));
        assert!(!a.as_str().contains('/'));
        assert_ne!(a, b);
        assert_eq!(a, CacheKey::derive(100, 100, &long_a));
    }

    #[test]
    fn test_shorten_respects_char_boundaries() {
        let source = format!("https://host/{}", "é".repeat(200));
        let key = CacheKey::derive(1, 1, &source);
        assert!(key.as_str().len() <= MAX_KEY_LEN);
        assert!(key.as_str().ends_with(".jpg"));
    }
}
