//! Flat-directory storage for resized artifacts
//!
//! Each artifact is a single file named after its cache key. Writes go to a
//! uniquely named temporary file that is renamed into place, so a reader never
//! sees a partial artifact and concurrent writers of the same key converge.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::CacheKey;
use crate::errors::TransformError;
use crate::models::ArtifactHandle;

#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    root: PathBuf,
}

impl ArtifactStorage {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if it does not exist yet
    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Whether the storage directory is present
    pub async fn is_available(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    pub fn path_for(&self, handle: &ArtifactHandle) -> PathBuf {
        self.root.join(handle.file_name())
    }

    /// Persist `bytes` under `key` and return the handle to read them back
    pub async fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<ArtifactHandle, TransformError> {
        let handle = ArtifactHandle::from(key);
        let final_path = self.path_for(&handle);
        let temp_path = self.root.join(format!(".{}.tmp", Uuid::new_v4()));

        let storage_error = |source: io::Error| TransformError::Storage {
            key: key.to_string(),
            source,
        };

        fs::write(&temp_path, bytes).await.map_err(storage_error)?;

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temporary artifact");
            }
            return Err(storage_error(e));
        }

        debug!(key = %key, bytes = bytes.len(), "Stored artifact");
        Ok(handle)
    }

    /// Read an artifact back by handle
    pub async fn load(&self, handle: &ArtifactHandle) -> io::Result<Bytes> {
        fs::read(self.path_for(handle)).await.map(Bytes::from)
    }
}
