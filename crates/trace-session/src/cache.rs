//! Persisted tree cache
//!
//! Two JSON blobs under the cache directory seed a reload without
//! refetching: `requirements.json` and `blocks.json`. The cache is an
//! optional accelerator, so readers treat every load failure as a miss.

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trace_model::{ArtifactId, ArtifactNode};

const REQUIREMENTS_FILE: &str = "requirements.json";
const BLOCKS_FILE: &str = "blocks.json";

/// Cached block tree of one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedBlocks {
    pub parent_id: ArtifactId,
    pub roots: Vec<ArtifactNode>,
}

/// JSON tree cache rooted at a directory
#[derive(Debug, Clone)]
pub struct TreeCache {
    dir: PathBuf,
}

impl TreeCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cached requirement forest, `None` on any failure
    pub async fn requirements(&self) -> Option<Vec<ArtifactNode>> {
        self.read_or_miss(REQUIREMENTS_FILE).await
    }

    /// Cached block tree of `parent`, `None` on a miss or another container
    pub async fn blocks(&self, parent: &str) -> Option<Vec<ArtifactNode>> {
        let cached: CachedBlocks = self.read_or_miss(BLOCKS_FILE).await?;
        (cached.parent_id == parent).then_some(cached.roots)
    }

    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or file cannot be written.
    pub async fn store_requirements(&self, roots: &[ArtifactNode]) -> Result<(), CacheError> {
        self.write(REQUIREMENTS_FILE, roots).await
    }

    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or file cannot be written.
    pub async fn store_blocks(
        &self,
        parent: &ArtifactId,
        roots: &[ArtifactNode],
    ) -> Result<(), CacheError> {
        #[derive(Serialize)]
        struct Entry<'a> {
            parent_id: &'a ArtifactId,
            roots: &'a [ArtifactNode],
        }
        self.write(
            BLOCKS_FILE,
            &Entry {
                parent_id: parent,
                roots,
            },
        )
        .await
    }

    /// Remove both blobs; missing files are fine
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] for any other removal failure.
    pub async fn clear(&self) -> Result<(), CacheError> {
        for name in [REQUIREMENTS_FILE, BLOCKS_FILE] {
            let path = self.dir.join(name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(CacheError::Io { path, source }),
            }
        }
        Ok(())
    }

    async fn read_or_miss<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        match self.read(name).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring unreadable tree cache entry");
                None
            }
        }
    }

    async fn read<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, CacheError> {
        let path = self.dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { path, source })
    }

    async fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(name);
        let bytes = serde_json::to_vec(value).map_err(|source| CacheError::Corrupt {
            path: path.clone(),
            source,
        })?;
        if let Err(source) = tokio::fs::write(&path, bytes).await {
            return Err(CacheError::Io { path, source });
        }
        tracing::debug!(path = %path.display(), "Stored tree cache entry");
        Ok(())
    }
}
