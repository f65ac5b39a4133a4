//! Storage adapters for iosrag.
//!
//! The system configuration lives in one JSON file; documents, downloads and
//! ingested files are kept in memory for the lifetime of the process.
#![deny(unused_crate_dependencies)]

pub mod repositories;

pub use repositories::{InMemoryDocumentRepository, JsonConfigStore};
