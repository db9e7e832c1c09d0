//! The file-store collaborator: stage bytes to disk, remove the staging
//! directory afterwards.
//!
//! ## Why stage at all?
//!
//! The upload step reads the document from the staged copy rather than the
//! caller's buffer, so the buffer can be dropped as soon as `convert` is
//! entered and very large documents are not held in memory twice. Staging
//! goes through a trait so host applications that already manage a scratch
//! area (the desktop app owns one) can point the pipeline at it.
//!
//! The pipeline removes the staging directory on both the success and
//! failure paths; removal failures are logged and never mask the
//! conversion's own result or error.

use crate::error::OcrMdError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A staged document: the written file plus the directory to remove when
/// the conversion finishes.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Write bytes under a fresh directory; delete that directory later.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `bytes` to `file_name` inside a newly created directory.
    async fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<StagedFile, OcrMdError>;

    /// Remove a directory created by [`FileStore::stage`].
    async fn remove(&self, dir: &Path) -> Result<(), OcrMdError>;
}

/// Default store: a unique `tempfile` directory per staged document.
pub struct TempDirStore {
    /// Parent for staging directories; the system temp dir when `None`.
    root: Option<PathBuf>,
}

impl TempDirStore {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Stage under `root` instead of the system temp dir.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl Default for TempDirStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStore for TempDirStore {
    async fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<StagedFile, OcrMdError> {
        let parent = self
            .root
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        // tempfile picks a collision-free name; keep() hands ownership of the
        // directory to us so removal happens through this trait, not Drop.
        let dir = tempfile::Builder::new()
            .prefix("ocr2md-")
            .tempdir_in(&parent)
            .map_err(|e| OcrMdError::StagingFailed {
                name: file_name.to_string(),
                detail: e.to_string(),
            })?
            .keep();

        let path = dir.join(sanitize_file_name(file_name));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| OcrMdError::StagingFailed {
                name: file_name.to_string(),
                detail: e.to_string(),
            })?;

        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(StagedFile { path, dir })
    }

    async fn remove(&self, dir: &Path) -> Result<(), OcrMdError> {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(|e| OcrMdError::Internal(format!("failed to remove {}: {e}", dir.display())))
    }
}

/// Strip path separators so a hostile document name cannot escape the
/// staging directory.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}
