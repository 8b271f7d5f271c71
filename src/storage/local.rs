//! Local filesystem storage implementation.
//!
//! Writes the aggregate as a single JSON array. The file is replaced
//! atomically so a failed run never leaves a truncated file behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{OutputConfig, Place};
use crate::storage::PlaceStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    pretty: bool,
}

impl LocalStorage {
    /// Create a LocalStorage writing compact JSON to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: false,
        }
    }

    /// Create a LocalStorage from output settings.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            pretty: config.pretty,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PlaceStorage for LocalStorage {
    async fn write_places(&self, places: &[Place]) -> Result<String> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(places)?
        } else {
            serde_json::to_vec(places)?
        };

        self.write_bytes(&bytes).await?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(self.path.display().to_string())
    }
}
