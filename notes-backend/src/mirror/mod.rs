//! Note mirror: one `<id>.md` file per note holding its body.
//!
//! The mirror is derived from the table and never read while serving
//! requests; `read` and `list_ids` exist for the consistency audit.

pub mod file_ops;

use async_trait::async_trait;
use futures_util::future::join_all;
use std::io;
use std::path::PathBuf;
use tokio::fs;

use crate::error::MirrorError;

#[async_trait]
pub trait FileMirror: Send + Sync {
    /// Create or overwrite the file for `id` with `body`
    async fn write(&self, id: &str, body: &str) -> Result<(), MirrorError>;

    /// Remove the file for `id`. `MirrorError::NotFound` if absent.
    async fn delete(&self, id: &str) -> Result<(), MirrorError>;

    /// Remove every note file in the mirror, returning how many were removed
    async fn clear(&self) -> Result<usize, MirrorError>;

    /// Raw bytes of the file for `id`
    async fn read(&self, id: &str) -> Result<Vec<u8>, MirrorError>;

    /// Ids of all note files currently in the mirror
    async fn list_ids(&self) -> Result<Vec<String>, MirrorError>;
}

/// Remove all `paths` concurrently. Every removal is attempted; the first
/// failure is returned once they have all finished.
async fn remove_files(paths: &[PathBuf]) -> Result<usize, MirrorError> {
    let results = join_all(paths.iter().map(|path| async move {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            // Removed by someone else in the meantime
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MirrorError::io(path, e)),
        }
    }))
    .await;

    let mut removed = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("[MIRROR] Failed to remove mirror file: {}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(removed),
    }
}

/// Mirror backed by a local directory
pub struct FsMirror {
    dir: PathBuf,
}

impl FsMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, MirrorError> {
        file_ops::note_path(&self.dir, id).map_err(|e| MirrorError::io(&self.dir, e))
    }
}

#[async_trait]
impl FileMirror for FsMirror {
    async fn write(&self, id: &str, body: &str) -> Result<(), MirrorError> {
        let path = self.path_for(id)?;
        file_ops::write_note(&path, body)
            .await
            .map_err(|e| MirrorError::io(&path, e))
    }

    async fn delete(&self, id: &str) -> Result<(), MirrorError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(MirrorError::NotFound(id.to_string()))
            }
            Err(e) => Err(MirrorError::io(&path, e)),
        }
    }

    async fn clear(&self) -> Result<usize, MirrorError> {
        let files = file_ops::list_notes(&self.dir)
            .await
            .map_err(|e| MirrorError::io(&self.dir, e))?;

        let removed = remove_files(&files).await?;
        log::debug!("[MIRROR] Cleared {} files from {}", removed, self.dir.display());
        Ok(removed)
    }

    async fn read(&self, id: &str) -> Result<Vec<u8>, MirrorError> {
        let path = self.path_for(id)?;
        match file_ops::read_note(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(MirrorError::NotFound(id.to_string()))
            }
            Err(e) => Err(MirrorError::io(&path, e)),
        }
    }

    async fn list_ids(&self) -> Result<Vec<String>, MirrorError> {
        let files = file_ops::list_notes(&self.dir)
            .await
            .map_err(|e| MirrorError::io(&self.dir, e))?;
        Ok(files.iter().filter_map(|p| file_ops::note_id(p)).collect())
    }
}
