//! Seeder — resets the table and the mirror to the demo fixtures
//!
//! Runs DROP, CREATE, POPULATE and MIRROR-RESET in order. A failing step is
//! logged and recorded in the report; later steps still run. This is a
//! development fixture, not a transactional reset.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use futures_util::future::join_all;
use notes_types::Note;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::db::NoteStore;
use crate::mirror::FileMirror;

/// A note to insert during seeding (id is generated at seed time)
#[derive(Debug, Clone)]
pub struct Fixture {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Fixture {
    pub fn new(title: &str, body: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            created_at,
        }
    }

    fn into_note(self) -> Note {
        Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStep {
    Drop,
    Create,
    Populate,
    MirrorReset,
}

impl SeedStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedStep::Drop => "drop",
            SeedStep::Create => "create",
            SeedStep::Populate => "populate",
            SeedStep::MirrorReset => "mirror-reset",
        }
    }
}

impl fmt::Display for SeedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SeedFailure {
    pub step: SeedStep,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub dropped_existing: bool,
    pub inserted: Vec<Note>,
    pub mirror_removed: usize,
    pub mirror_written: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, step: SeedStep, message: impl Into<String>) {
        let message = message.into();
        log::error!("[SEED] Step {} failed: {}", step, message);
        self.failures.push(SeedFailure { step, message });
    }
}

/// Random instant in `[start, end]`
fn random_between(start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc> {
    let (lo, hi) = (start.timestamp_millis(), end.timestamp_millis());
    if hi <= lo {
        return end;
    }
    let millis = rand::thread_rng().gen_range(lo..=hi);
    Utc.timestamp_millis_opt(millis).single().unwrap_or(end)
}

fn start_of_year(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// The demo notes: three dated somewhere this year, one dated now
pub fn default_fixtures(now: DateTime<Utc>) -> Vec<Fixture> {
    let year_start = start_of_year(now);

    vec![
        Fixture::new(
            "Meeting Notes",
            "This is an example note. It contains **Markdown**!",
            random_between(year_start, now),
        ),
        Fixture::new(
            "Make a thing",
            "It's very easy to make some words **bold** and other words *italic* with\n\
             Markdown. You can even [link to React's website!](https://www.reactjs.org).",
            random_between(year_start, now),
        ),
        Fixture::new(
            "A note with a very long title because sometimes you need more words",
            "You can write all kinds of [amazing](https://en.wikipedia.org/wiki/The_Amazing)\n\
             notes in this app! These note live on the server in the `notes` folder.\n\
             \n\
             ![This app is powered by React](https://upload.wikimedia.org/wikipedia/commons/thumb/1/18/React_Native_Logo.png/800px-React_Native_Logo.png)",
            random_between(year_start, now),
        ),
        Fixture::new("I wrote this note today", "It was an excellent note.", now),
    ]
}

pub struct Seeder {
    store: Arc<dyn NoteStore>,
    mirror: Arc<dyn FileMirror>,
}

impl Seeder {
    pub fn new(store: Arc<dyn NoteStore>, mirror: Arc<dyn FileMirror>) -> Self {
        Self { store, mirror }
    }

    pub async fn run(&self, fixtures: Vec<Fixture>) -> SeedReport {
        let mut report = SeedReport::default();

        // DROP
        match self.store.drop_table().await {
            Ok(true) => {
                report.dropped_existing = true;
                log::info!("[SEED] Deleted existing notes table");
            }
            Ok(false) => log::info!("[SEED] Table didn't exist"),
            Err(e) => report.fail(SeedStep::Drop, e.to_string()),
        }

        // CREATE
        match self.store.create_table().await {
            Ok(()) => log::info!("[SEED] Created notes table"),
            Err(e) => report.fail(SeedStep::Create, e.to_string()),
        }

        // POPULATE
        let notes: Vec<Note> = fixtures.into_iter().map(Fixture::into_note).collect();
        let results = join_all(notes.iter().map(|note| self.store.put(note))).await;
        let mut first_error = None;
        for (note, result) in notes.into_iter().zip(results) {
            match result {
                Ok(()) => report.inserted.push(note),
                Err(e) => {
                    log::warn!("[SEED] Failed to insert '{}': {}", note.title, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            report.fail(SeedStep::Populate, e.to_string());
        }
        log::info!("[SEED] Inserted {} notes", report.inserted.len());

        // MIRROR-RESET
        log::info!("[SEED] Deleting old mirror files");
        match self.mirror.clear().await {
            Ok(removed) => report.mirror_removed = removed,
            Err(e) => report.fail(SeedStep::MirrorReset, format!("clearing mirror: {}", e)),
        }

        log::info!("[SEED] Creating new mirror files");
        let results = join_all(
            report
                .inserted
                .iter()
                .map(|note| self.mirror.write(&note.id, &note.body)),
        )
        .await;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(()) => report.mirror_written += 1,
                Err(e) => {
                    log::warn!("[SEED] Failed to write mirror file: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            report.fail(SeedStep::MirrorReset, format!("writing mirror: {}", e));
        }

        log::info!(
            "[SEED] Done: {} notes, {} old files removed, {} files written, {} failures",
            report.inserted.len(),
            report.mirror_removed,
            report.mirror_written,
            report.failures.len()
        );

        report
    }
}
