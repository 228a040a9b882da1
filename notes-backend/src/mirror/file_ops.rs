//! File operations for the note mirror
//!
//! Handles path resolution, reading/writing `<id>.md` files, and listing the
//! mirror directory.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const NOTE_EXTENSION: &str = "md";

/// Resolve the mirror path for a note id, rejecting ids that would escape the directory
pub fn note_path(dir: &Path, id: &str) -> io::Result<PathBuf> {
    let invalid = id.is_empty()
        || id.starts_with('.')
        || id.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid note id for mirror file: {:?}", id),
        ));
    }
    Ok(dir.join(format!("{}.{}", id, NOTE_EXTENSION)))
}

/// Extract the note id from a mirror file path (`<id>.md` -> `<id>`)
pub fn note_id(path: &Path) -> Option<String> {
    if path.extension().map(|e| e == NOTE_EXTENSION).unwrap_or(false) {
        path.file_stem().map(|s| s.to_string_lossy().to_string())
    } else {
        None
    }
}

/// Write a note file (creates the parent directory as needed).
/// The handle is flushed before it is dropped.
pub async fn write_note(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::File::create(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Raw file contents; bodies are compared byte for byte, so no UTF-8 check here
pub async fn read_note(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path).await
}

/// List every regular `.md` file directly inside the mirror directory,
/// dot-files included. A missing directory lists as empty.
pub async fn list_notes(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let mut read_dir = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e),
    };

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && note_id(&path).is_some() {
            files.push(path);
        }
    }

    Ok(files)
}
