//! Reset the notes table and mirror directory to the demo fixtures.
//!
//! Uses the same environment as the server (DATABASE_URL, NOTES_DIR).
//! Exits non-zero if any seeding step failed.

use chrono::Utc;
use dotenv::dotenv;
use std::sync::Arc;

use notes_backend::config::{Config, StoreBackend};
use notes_backend::db;
use notes_backend::mirror::FsMirror;
use notes_backend::seed::{default_fixtures, Seeder};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    if config.store_backend == StoreBackend::Memory {
        log::warn!("[SEED] In-memory store selected; seeded notes will not outlive this process");
    }

    let store = match db::open_store(&config) {
        Ok(store) => store,
        Err(e) => {
            log::error!("[SEED] Failed to open note store: {}", e);
            std::process::exit(1);
        }
    };
    let mirror = Arc::new(FsMirror::new(&config.notes_dir));

    let report = Seeder::new(store, mirror).run(default_fixtures(Utc::now())).await;

    for note in &report.inserted {
        log::info!("[SEED] {} -> {}", note.id, note.title);
    }

    if !report.is_success() {
        for failure in &report.failures {
            log::error!("[SEED] {}: {}", failure.step, failure.message);
        }
        std::process::exit(1);
    }
}
