//! Notes backend — a small notes service over a key-value table with a
//! markdown file mirror of every note body.

pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod mirror;
pub mod seed;
pub mod service;

use std::sync::Arc;

use config::Config;
use service::NoteService;

pub struct AppState {
    pub notes: Arc<NoteService>,
    pub config: Config,
    /// Server start time for uptime calculation
    pub started_at: std::time::Instant,
}
