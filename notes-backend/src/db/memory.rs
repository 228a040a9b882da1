//! In-process note table, used by tests and `NOTES_STORE_BACKEND=memory`.

use async_trait::async_trait;
use notes_types::Note;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{NotePatch, NoteStore};
use crate::error::{NoteError, NoteResult};

/// `None` means the table has been dropped and not yet recreated.
pub struct MemoryNoteStore {
    table: RwLock<Option<HashMap<String, Note>>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Some(HashMap::new())),
        }
    }
}

impl Default for MemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_table() -> NoteError {
    NoteError::StoreUnavailable("table notes does not exist".to_string())
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn put(&self, note: &Note) -> NoteResult<()> {
        let mut guard = self.table.write();
        let table = guard.as_mut().ok_or_else(missing_table)?;
        table.insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn update(&self, id: &str, patch: NotePatch) -> NoteResult<Note> {
        let mut guard = self.table.write();
        let table = guard.as_mut().ok_or_else(missing_table)?;
        let note = table
            .get_mut(id)
            .ok_or_else(|| NoteError::NotFound(id.to_string()))?;
        note.title = patch.title;
        note.body = patch.body;
        note.updated_at = patch.updated_at;
        Ok(note.clone())
    }

    async fn delete(&self, id: &str) -> NoteResult<()> {
        let mut guard = self.table.write();
        let table = guard.as_mut().ok_or_else(missing_table)?;
        table
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| NoteError::NotFound(id.to_string()))
    }

    async fn get(&self, id: &str) -> NoteResult<Note> {
        let guard = self.table.read();
        let table = guard.as_ref().ok_or_else(missing_table)?;
        table
            .get(id)
            .cloned()
            .ok_or_else(|| NoteError::NotFound(id.to_string()))
    }

    async fn list(&self) -> NoteResult<Vec<Note>> {
        let guard = self.table.read();
        let table = guard.as_ref().ok_or_else(missing_table)?;
        Ok(table.values().cloned().collect())
    }

    async fn drop_table(&self) -> NoteResult<bool> {
        Ok(self.table.write().take().is_some())
    }

    async fn create_table(&self) -> NoteResult<()> {
        let mut guard = self.table.write();
        if guard.is_none() {
            *guard = Some(HashMap::new());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(id: &str) -> Note {
        let now = Utc::now();
        Note {
            id: id.to_string(),
            title: format!("title {}", id),
            body: format!("body {}", id),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let store = MemoryNoteStore::new();
        store.put(&note("a")).await.unwrap();
        store.put(&note("b")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);

        let patched = store
            .update(
                "a",
                NotePatch {
                    title: "renamed".to_string(),
                    body: "rewritten".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.title, "renamed");
        assert_eq!(store.get("a").await.unwrap().body, "rewritten");

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap_err().is_not_found());
        assert!(store.delete("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_dropped_table_rejects_operations() {
        let store = MemoryNoteStore::new();
        store.put(&note("a")).await.unwrap();

        assert!(store.drop_table().await.unwrap());
        assert!(!store.drop_table().await.unwrap());
        assert!(matches!(
            store.get("a").await,
            Err(NoteError::StoreUnavailable(_))
        ));

        store.create_table().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
