//! Artifact storage
//!
//! Artifacts are uuid-named files under a configured root directory. A file
//! only becomes a `StoredArtifact` once it has been flushed to storage and
//! its size recorded; a failed pipeline stage discards its partial file, so
//! readers never observe a half-written artifact as complete.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use uuid::Uuid;

use crate::error::{IngestError, Result};

/// A finalized, byte-complete artifact on disk
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl StoredArtifact {
    /// File extension, used to derive the serving MIME type
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }
}

/// Store for upload artifacts
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, recreating the root directory from scratch.
    ///
    /// Artifacts do not survive a restart: the registry that owns them is
    /// in-memory, so files from a previous run would be unreachable anyway.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() {
            std::fs::remove_dir_all(&root)
                .map_err(|e| IngestError::StorageWrite(format!("clear {}: {e}", root.display())))?;
        }
        std::fs::create_dir_all(&root)
            .map_err(|e| IngestError::StorageWrite(format!("create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh artifact file with a uuid name and the given extension
    pub async fn create(&self, ext: &str) -> Result<(PathBuf, File)> {
        let path = self.root.join(format!("{}.{}", Uuid::new_v4(), ext));
        let file = File::create(&path)
            .await
            .map_err(|e| IngestError::StorageWrite(format!("create {}: {e}", path.display())))?;
        Ok((path, file))
    }

    /// Sync a finished artifact file and record its size
    pub async fn finalize(&self, path: PathBuf, file: File) -> Result<StoredArtifact> {
        file.sync_all()
            .await
            .map_err(|e| IngestError::StorageWrite(format!("sync {}: {e}", path.display())))?;
        drop(file);
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| IngestError::StorageWrite(format!("stat {}: {e}", path.display())))?;
        Ok(StoredArtifact {
            path,
            size_bytes: meta.len(),
        })
    }

    /// Remove a partial artifact after a failed stage. Best effort.
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("failed to remove artifact {}: {}", path.display(), e);
            }
        }
    }

    /// Remove a finalized artifact when its owning sound record is deleted
    pub async fn remove(&self, artifact: &StoredArtifact) {
        self.discard(&artifact.path).await;
    }
}
