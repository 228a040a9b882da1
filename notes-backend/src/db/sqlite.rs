//! SQLite-backed note table
//!
//! Connections come from an r2d2 pool; every query runs on the blocking
//! thread pool so request handlers yield while SQLite works.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use notes_types::Note;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

use super::{NotePatch, NoteStore};
use crate::error::{NoteError, NoteResult};

type DbPool = Pool<SqliteConnectionManager>;

const TABLE_NAME: &str = "notes";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

pub struct SqliteNoteStore {
    pool: DbPool,
}

impl SqliteNoteStore {
    /// Open (or create) the database file and make sure the notes table exists
    pub fn new(database_url: &str) -> NoteResult<Self> {
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    NoteError::StoreUnavailable(format!(
                        "cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let manager = SqliteConnectionManager::file(database_url)
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
        let pool = Pool::builder().max_size(8).build(manager)?;

        let conn = pool.get()?;
        conn.execute(CREATE_TABLE_SQL, [])?;

        log::info!("[NOTES] SQLite table store ready at {}", database_url);
        Ok(Self { pool })
    }

    async fn with_conn<T, F>(&self, f: F) -> NoteResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> NoteResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_at: parse_timestamp(3, &created_at)?,
        updated_at: parse_timestamp(4, &updated_at)?,
    })
}

fn select_note(conn: &Connection, id: &str) -> NoteResult<Note> {
    conn.query_row(
        "SELECT id, title, body, created_at, updated_at FROM notes WHERE id = ?1",
        params![id],
        row_to_note,
    )
    .optional()?
    .ok_or_else(|| NoteError::NotFound(id.to_string()))
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn put(&self, note: &Note) -> NoteResult<()> {
        let note = note.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO notes (id, title, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    note.id,
                    note.title,
                    note.body,
                    format_timestamp(&note.created_at),
                    format_timestamp(&note.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update(&self, id: &str, patch: NotePatch) -> NoteResult<Note> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE notes SET title = ?2, body = ?3, updated_at = ?4 WHERE id = ?1",
                params![id, patch.title, patch.body, format_timestamp(&patch.updated_at)],
            )?;
            if changed == 0 {
                return Err(NoteError::NotFound(id));
            }
            select_note(conn, &id)
        })
        .await
    }

    async fn delete(&self, id: &str) -> NoteResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(NoteError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> NoteResult<Note> {
        let id = id.to_string();
        self.with_conn(move |conn| select_note(conn, &id)).await
    }

    async fn list(&self) -> NoteResult<Vec<Note>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, body, created_at, updated_at FROM notes")?;
            let notes = stmt
                .query_map([], row_to_note)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(notes)
        })
        .await
    }

    async fn drop_table(&self) -> NoteResult<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![TABLE_NAME],
                |row| row.get::<_, i64>(0).map(|c| c > 0),
            )?;
            if exists {
                conn.execute("DROP TABLE notes", [])?;
            }
            Ok(exists)
        })
        .await
    }

    async fn create_table(&self) -> NoteResult<()> {
        self.with_conn(|conn| {
            conn.execute(CREATE_TABLE_SQL, [])?;
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn note(id: &str, title: &str, body: &str) -> Note {
        let now = Utc::now();
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> SqliteNoteStore {
        let db_path = dir.path().join(".db/notes.db");
        SqliteNoteStore::new(db_path.to_str().unwrap()).expect("Failed to open store")
    }

    #[tokio::test]
    async fn test_put_and_get_preserves_timestamps() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let original = note("n1", "Meeting Notes", "Agenda: ...");
        store.put(&original).await.unwrap();

        let fetched = store.get("n1").await.unwrap();
        assert_eq!(fetched, original);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_record() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        store.put(&note("n1", "First", "one")).await.unwrap();
        store.put(&note("n1", "Second", "two")).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Second");
    }

    #[tokio::test]
    async fn test_update_patches_fields() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let original = note("n1", "Title", "old body");
        store.put(&original).await.unwrap();

        let later = original.updated_at + chrono::Duration::seconds(5);
        let updated = store
            .update(
                "n1",
                NotePatch {
                    title: "New Title".to_string(),
                    body: "new body".to_string(),
                    updated_at: later,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.body, "new body");
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.updated_at, later);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let result = store
            .update(
                "ghost",
                NotePatch {
                    title: "t".to_string(),
                    body: "b".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await;
        assert!(matches!(result, Err(NoteError::NotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        store.put(&note("n1", "t", "b")).await.unwrap();
        store.delete("n1").await.unwrap();

        assert!(store.get("n1").await.unwrap_err().is_not_found());
        assert!(store.delete("n1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_drop_and_create_table() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        store.put(&note("n1", "t", "b")).await.unwrap();

        assert!(store.drop_table().await.unwrap());
        // Second drop finds nothing to drop
        assert!(!store.drop_table().await.unwrap());

        // Operations against a dropped table are store failures
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, NoteError::StoreUnavailable(_)));

        store.create_table().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
