//! Document catalog port: discovery, web search and the indexed library.
//!
//! Implementations may be static lookup tables or real search backends; the
//! operation runner only sees this contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DocumentRecord, LibraryDocument};

/// Errors reported by a document catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No document with this identifier.
    #[error("Document {0} not found")]
    NotFound(String),

    /// A single source failed; callers may skip it and continue.
    #[error("Search failed for {site}: {reason}")]
    SourceFailed { site: String, reason: String },

    /// A document could not be fetched.
    #[error("Fetch failed for {location}: {reason}")]
    FetchFailed { location: String, reason: String },

    /// The catalog backend is unreachable.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Full text and metadata of a library document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    #[serde(flatten)]
    pub document: LibraryDocument,
    pub content: String,
    pub content_type: String,
    pub retrieved_at: chrono::DateTime<chrono::Utc>,
}

/// Result of fetching a document to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedDocument {
    pub local_path: String,
    pub size_bytes: u64,
}

/// Port for document discovery, search and retrieval.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    /// Sites searched when a discovery request names none.
    fn trusted_sources(&self) -> Vec<String>;

    /// Search one site for documents matching `query`.
    async fn search_site(
        &self,
        query: &str,
        site: &str,
    ) -> Result<Vec<DocumentRecord>, CatalogError>;

    /// Open web search used by the AI agent.
    async fn search_web(&self, query: &str) -> Result<Vec<DocumentRecord>, CatalogError>;

    /// All documents in the indexed library.
    async fn library(&self) -> Result<Vec<LibraryDocument>, CatalogError>;

    /// Content of one library document.
    async fn document_content(&self, id: &str) -> Result<DocumentContent, CatalogError>;

    /// Fetch a document into local storage.
    async fn fetch(&self, document: &DocumentRecord) -> Result<FetchedDocument, CatalogError>;

    /// Query completions for a partial query, at most `limit`.
    fn suggestions(&self, partial: &str, limit: usize) -> Vec<String>;
}
