//! `TextExtractor` implementation over the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use iosrag_core::{ExtractError, ExtractedText, TextExtractor};
use walkdir::WalkDir;

use crate::formats::Format;

/// Files above this size are rejected unread.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn io_error(path: &Path, err: &impl std::fmt::Display) -> ExtractError {
    ExtractError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Extracts text from files on disk, dispatching on the file extension.
///
/// Parsing runs on the blocking thread pool so large PDFs never stall the
/// connection tasks.
#[derive(Debug, Clone)]
pub struct FileTextExtractor {
    max_file_bytes: u64,
}

impl Default for FileTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FileTextExtractor {
    pub const fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    fn format_of(path: &Path) -> Result<Format, ExtractError> {
        let extension = extension_of(path);
        Format::from_extension(&extension).ok_or_else(|| {
            ExtractError::Unsupported(if extension.is_empty() {
                path.display().to_string()
            } else {
                extension
            })
        })
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    fn supports(&self, extension: &str) -> bool {
        Format::from_extension(extension).is_some()
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let format = Self::format_of(path)?;
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| io_error(path, &e))?;
        if !metadata.is_file() {
            return Err(io_error(path, &"not a regular file"));
        }
        if metadata.len() > self.max_file_bytes {
            return Err(ExtractError::TooLarge {
                path: path.display().to_string(),
                size: metadata.len(),
                limit: self.max_file_bytes,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| io_error(path, &e))?;
        let size_bytes = bytes.len() as u64;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = tokio::task::spawn_blocking(move || format.extract(&bytes, &name))
            .await
            .map_err(|e| io_error(path, &e))?
            .map_err(|reason| ExtractError::Parse {
                path: path.display().to_string(),
                reason,
            })?;

        tracing::debug!(
            target: "iosrag.extract",
            path = %path.display(),
            %format,
            chars = text.len(),
            "Text extracted"
        );
        Ok(ExtractedText {
            text,
            format: extension_of(path),
            size_bytes,
        })
    }

    async fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let root = dir.to_path_buf();
        let walk = tokio::task::spawn_blocking(move || {
            if !root.is_dir() {
                return Err(io_error(&root, &"not a directory"));
            }
            let mut files = Vec::new();
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(target: "iosrag.extract", error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if entry.file_type().is_file()
                    && Format::from_extension(&extension_of(entry.path())).is_some()
                {
                    files.push(entry.into_path());
                }
            }
            files.sort();
            Ok(files)
        });
        walk.await.map_err(|e| io_error(dir, &e))?
    }
}
