use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Directory holding the `<id>.md` mirror files.
    pub const NOTES_DIR: &str = "NOTES_DIR";
    /// Table backend: "sqlite" (default) or "memory".
    pub const STORE_BACKEND: &str = "NOTES_STORE_BACKEND";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 4000;
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const NOTES_DIR: &str = "notes";
}

/// Which NoteStore implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Some(StoreBackend::Sqlite),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Returns the absolute path to the notes-backend directory.
/// Uses CARGO_MANIFEST_DIR at compile time, so it always resolves
/// to notes-backend/ regardless of the working directory at runtime.
pub fn backend_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Get the default mirror directory
pub fn notes_dir() -> PathBuf {
    backend_dir().join(defaults::NOTES_DIR)
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub notes_dir: PathBuf,
    pub store_backend: StoreBackend,
}

impl Config {
    pub fn from_env() -> Self {
        let port = match env::var(env_vars::PORT) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Invalid {} '{}', using {}", env_vars::PORT, raw, defaults::PORT);
                defaults::PORT
            }),
            Err(_) => defaults::PORT,
        };

        let store_backend = match env::var(env_vars::STORE_BACKEND) {
            Ok(raw) => StoreBackend::from_str(&raw).unwrap_or_else(|| {
                log::warn!(
                    "Unknown {} '{}', falling back to sqlite",
                    env_vars::STORE_BACKEND,
                    raw
                );
                StoreBackend::Sqlite
            }),
            Err(_) => StoreBackend::Sqlite,
        };

        Self {
            port,
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            notes_dir: env::var(env_vars::NOTES_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| notes_dir()),
            store_backend,
        }
    }
}
