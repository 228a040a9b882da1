//! Shared types for the notes backend and its HTTP clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =====================================================
// Domain Types
// =====================================================

/// A note record, as stored in the table and sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Markdown body; mirrored verbatim to `<id>.md`
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =====================================================
// Request Types
// =====================================================

/// Create a note (id and timestamps are assigned server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub body: String,
}

/// Replace a note's title and body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub body: String,
}

// =====================================================
// Response Types
// =====================================================

/// A note returned from a mutation.
///
/// `mirror_warning` is set when the table write succeeded but the mirror
/// file could not be written; the table record is still authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    #[serde(flatten)]
    pub note: Note,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNoteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_warning: Option<String>,
}

/// Result of comparing the table against the mirror directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorStatus {
    /// Notes in the table with no `<id>.md` file
    pub missing: Vec<String>,
    /// Mirror files whose contents differ from the table body
    pub stale: Vec<String>,
    /// Mirror files with no table record
    pub orphaned: Vec<String>,
}

impl MirrorStatus {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.orphaned.is_empty()
    }
}
