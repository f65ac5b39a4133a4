//! Text extraction for local document ingestion.
//!
//! Supports PDF, DOCX/XLSX/PPTX, CSV/TSV, plain text and configuration
//! files, and images (described by metadata only).
#![deny(unused_crate_dependencies)]

mod extractor;
mod formats;

pub use extractor::{DEFAULT_MAX_FILE_BYTES, FileTextExtractor};
pub use formats::Format;
