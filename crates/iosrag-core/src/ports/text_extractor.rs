//! Text extraction port keyed by file extension.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from text extraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    TooLarge { path: String, size: u64, limit: u64 },
}

/// Text pulled out of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    /// Normalized extension, lower case without the dot.
    pub format: String,
    pub size_bytes: u64,
}

/// Port for turning files into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Whether files with this extension (no dot, any case) can be extracted.
    fn supports(&self, extension: &str) -> bool;

    /// Extract plain text from the file at `path`.
    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError>;

    /// Recursively list supported files under `dir`, sorted by path.
    async fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, ExtractError>;
}
