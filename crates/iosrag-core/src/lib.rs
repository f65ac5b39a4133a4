//! Core of the iosrag document discovery backend.
//!
//! Holds the domain types, the ports adapters implement, the step-based
//! operation runner and the task catalog. Nothing here knows about sockets,
//! files or HTTP.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod events;
pub mod fingerprint;
pub mod ports;
pub mod runner;
pub mod services;
pub mod tasks;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::{
    ApiKey, ConfigError, DatabaseConfig, DatabaseType, LlmConfig, LlmProvider, NewApiKey,
    OperationMode, SystemConfig, SystemConfigUpdate, mask_secret, validate_config,
};
pub use domain::{
    AdvancedSearchRequest, AdvancedSearchResult, DocumentRecord, DownloadStatus, LibraryDocument,
    LocalFileRecord, OperationKind, OperationStatus, SearchError, SearchFilters, SkippedFile, Step,
    StepStatus,
};
pub use events::{OperationUpdate, ServerEvent, StatusNotice};
pub use fingerprint::{content_hash, short_id, stable_number};
pub use ports::{
    CapacityUsage, CatalogError, ConfigStore, CoreError, CpuUsage, DocumentCatalog,
    DocumentContent, DocumentRepository, ExtractError, ExtractedText, FetchedDocument, GpuUsage,
    LlmClient, LlmError, NoopSink, ProgressSink, RepositoryError, SystemProbePort,
    SystemResources, TextExtractor,
};
pub use runner::{
    OperationError, OperationOutcome, OperationRunner, OperationTask, Pacing, StepContext, StepDef,
};
pub use services::{AppCore, CoreDeps};

#[cfg(test)]
use tokio_test as _;
