//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the core expects from infrastructure. They use
//! only domain types; implementations live in adapter crates.

pub mod config_store;
pub mod document_catalog;
pub mod document_repository;
pub mod llm_client;
pub mod progress_sink;
pub mod system_probe;
pub mod text_extractor;

use thiserror::Error;

pub use config_store::ConfigStore;
pub use document_catalog::{CatalogError, DocumentCatalog, DocumentContent, FetchedDocument};
pub use document_repository::DocumentRepository;
pub use llm_client::{LlmClient, LlmError};
pub use progress_sink::{NoopSink, ProgressSink};
pub use system_probe::{CapacityUsage, CpuUsage, GpuUsage, SystemProbePort, SystemResources};
pub use text_extractor::{ExtractError, ExtractedText, TextExtractor};

/// Domain-specific errors for storage operations.
///
/// Abstracts away storage details (filesystem, serialization format) so
/// services handle failures uniformly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (filesystem, lock poisoning).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own surface: HTTP status codes for REST and
/// `error` messages on the client channel.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Search(#[from] crate::domain::SearchError),

    /// Invalid input from a client.
    #[error("{0}")]
    Validation(String),

    /// Unexpected condition.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the error was caused by the request rather than the system.
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Config(_)
                | Self::Search(_)
                | Self::Catalog(CatalogError::NotFound(_))
                | Self::Repository(RepositoryError::NotFound(_))
        )
    }
}
