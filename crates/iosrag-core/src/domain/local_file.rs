//! Records for files ingested from the local filesystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept as a text preview.
pub const PREVIEW_CHARS: usize = 200;

/// A local file whose text was extracted successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileRecord {
    pub id: String,
    pub name: String,
    pub path: String,
    pub extension: String,
    pub size_bytes: u64,
    pub text_length: usize,
    pub preview: String,
    pub content_hash: String,
    pub processed_at: DateTime<Utc>,
}

/// A file that could not be processed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub name: String,
    pub error: String,
}

/// First [`PREVIEW_CHARS`] characters of `text`, whitespace collapsed.
pub fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(PREVIEW_CHARS).collect()
}
