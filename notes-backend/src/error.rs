//! Error kinds shared by the table store, the file mirror and the service.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure touching a note's mirror file
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror file not found for note {0}")]
    NotFound(String),

    #[error("mirror I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MirrorError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MirrorError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum NoteError {
    /// The identifier is absent from the table
    #[error("note not found: {0}")]
    NotFound(String),

    /// The table backend is unreachable or rejected the operation
    #[error("note store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    MirrorIo(#[from] MirrorError),
}

impl NoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, NoteError::NotFound(_))
    }
}

impl From<rusqlite::Error> for NoteError {
    fn from(e: rusqlite::Error) -> Self {
        NoteError::StoreUnavailable(e.to_string())
    }
}

impl From<r2d2::Error> for NoteError {
    fn from(e: r2d2::Error) -> Self {
        NoteError::StoreUnavailable(format!("connection pool: {}", e))
    }
}

impl From<tokio::task::JoinError> for NoteError {
    fn from(e: tokio::task::JoinError) -> Self {
        NoteError::StoreUnavailable(format!("store task failed: {}", e))
    }
}

pub type NoteResult<T> = Result<T, NoteError>;
