//! Table store for note records.
//!
//! The table is the record of truth: the service writes here first and reads
//! only from here. Two backends implement [`NoteStore`]: SQLite for real runs
//! and an in-process table for tests and throwaway instances.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_types::Note;
use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::error::NoteResult;

pub use memory::MemoryNoteStore;
pub use sqlite::SqliteNoteStore;

/// Fields replaced by an update; id and created_at never change
#[derive(Debug, Clone)]
pub struct NotePatch {
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert or fully replace a record
    async fn put(&self, note: &Note) -> NoteResult<()>;

    /// Patch an existing record, returning it. `NotFound` if absent.
    async fn update(&self, id: &str, patch: NotePatch) -> NoteResult<Note>;

    /// Remove a record. `NotFound` if absent.
    async fn delete(&self, id: &str) -> NoteResult<()>;

    async fn get(&self, id: &str) -> NoteResult<Note>;

    /// Full scan, order unspecified
    async fn list(&self) -> NoteResult<Vec<Note>>;

    /// Drop the table. Returns whether a table existed; a missing table is not an error.
    async fn drop_table(&self) -> NoteResult<bool>;

    /// Create the table if it does not exist
    async fn create_table(&self) -> NoteResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Open the table store selected by the configuration
pub fn open_store(config: &Config) -> NoteResult<Arc<dyn NoteStore>> {
    match config.store_backend {
        StoreBackend::Sqlite => Ok(Arc::new(SqliteNoteStore::new(&config.database_url)?)),
        StoreBackend::Memory => {
            log::warn!("[NOTES] Using in-memory table store; notes are lost on exit");
            Ok(Arc::new(MemoryNoteStore::new()))
        }
    }
}
