//! NoteService — dual writes across the table store and the file mirror
//!
//! Every mutation hits the table first and the mirror second. The table is
//! authoritative: a mirror failure after a successful table write is not
//! rolled back or retried, it is handed back to the caller as a warning.

use chrono::{DateTime, Duration, Utc};
use notes_types::{MirrorStatus, Note};
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{NotePatch, NoteStore};
use crate::error::{MirrorError, NoteResult};
use crate::mirror::FileMirror;

/// Result of a mutation whose table write succeeded.
/// `mirror_warning` is set when the mirror could not be brought in line.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    pub value: T,
    pub mirror_warning: Option<MirrorError>,
}

impl<T> WriteOutcome<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            mirror_warning: None,
        }
    }

    fn stale(value: T, warning: MirrorError) -> Self {
        Self {
            value,
            mirror_warning: Some(warning),
        }
    }

    pub fn warning_message(&self) -> Option<String> {
        self.mirror_warning.as_ref().map(|e| e.to_string())
    }
}

pub struct NoteService {
    store: Arc<dyn NoteStore>,
    mirror: Arc<dyn FileMirror>,
}

/// Next `updated_at`: now, but strictly after the previous value
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, mirror: Arc<dyn FileMirror>) -> Self {
        Self { store, mirror }
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    pub async fn create(&self, title: &str, body: &str) -> NoteResult<WriteOutcome<Note>> {
        let now = Utc::now();
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store.put(&note).await?;
        log::info!("[NOTES] Created note {}", note.id);

        match self.mirror.write(&note.id, &note.body).await {
            Ok(()) => Ok(WriteOutcome::clean(note)),
            Err(e) => {
                log::warn!("[MIRROR] Note {} saved but mirror write failed: {}", note.id, e);
                Ok(WriteOutcome::stale(note, e))
            }
        }
    }

    pub async fn update(&self, id: &str, title: &str, body: &str) -> NoteResult<WriteOutcome<Note>> {
        // NotFound here aborts before the mirror is touched
        let existing = self.store.get(id).await?;

        let patch = NotePatch {
            title: title.to_string(),
            body: body.to_string(),
            updated_at: next_timestamp(existing.updated_at),
        };
        // Updates are not serialized; two racing updates may share an updated_at
        let note = self.store.update(id, patch).await?;
        log::info!("[NOTES] Updated note {}", id);

        match self.mirror.write(id, &note.body).await {
            Ok(()) => Ok(WriteOutcome::clean(note)),
            Err(e) => {
                log::warn!("[MIRROR] Note {} updated but mirror write failed: {}", id, e);
                Ok(WriteOutcome::stale(note, e))
            }
        }
    }

    pub async fn delete(&self, id: &str) -> NoteResult<WriteOutcome<()>> {
        self.store.delete(id).await?;
        log::info!("[NOTES] Deleted note {}", id);

        match self.mirror.delete(id).await {
            Ok(()) => Ok(WriteOutcome::clean(())),
            Err(MirrorError::NotFound(_)) => {
                log::debug!("[MIRROR] No mirror file to delete for {}", id);
                Ok(WriteOutcome::clean(()))
            }
            Err(e) => {
                log::warn!("[MIRROR] Note {} deleted but mirror delete failed: {}", id, e);
                Ok(WriteOutcome::stale((), e))
            }
        }
    }

    pub async fn get(&self, id: &str) -> NoteResult<Note> {
        self.store.get(id).await
    }

    /// All notes, most recently updated first
    pub async fn list(&self) -> NoteResult<Vec<Note>> {
        let mut notes = self.store.list().await?;
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    /// Compare the table with the mirror directory. Reports drift, repairs nothing.
    pub async fn audit(&self) -> NoteResult<MirrorStatus> {
        let notes = self.store.list().await?;
        let mirror_ids: HashSet<String> = self.mirror.list_ids().await?.into_iter().collect();

        let mut status = MirrorStatus::default();
        let mut table_ids = HashSet::with_capacity(notes.len());

        for note in &notes {
            table_ids.insert(note.id.as_str());
            if !mirror_ids.contains(&note.id) {
                status.missing.push(note.id.clone());
                continue;
            }
            // Byte comparison: a file that is not valid UTF-8 is stale, not an error
            match self.mirror.read(&note.id).await {
                Ok(content) if content == note.body.as_bytes() => {}
                Ok(_) => status.stale.push(note.id.clone()),
                // Deleted between listing and reading
                Err(MirrorError::NotFound(_)) => status.missing.push(note.id.clone()),
                Err(e) => return Err(e.into()),
            }
        }

        status.orphaned = mirror_ids
            .iter()
            .filter(|id| !table_ids.contains(id.as_str()))
            .cloned()
            .collect();

        status.missing.sort();
        status.stale.sort();
        status.orphaned.sort();

        if !status.is_consistent() {
            log::warn!(
                "[MIRROR] Drift detected: {} missing, {} stale, {} orphaned",
                status.missing.len(),
                status.stale.len(),
                status.orphaned.len()
            );
        }

        Ok(status)
    }
}
