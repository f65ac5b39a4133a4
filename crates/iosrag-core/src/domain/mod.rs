//! Core domain types.
//!
//! These types are transport-agnostic; adapters serialize them as-is.

mod document;
mod local_file;
mod operation;
mod search;

pub use document::{DocumentRecord, DownloadStatus, sort_by_relevance};
pub use local_file::{LocalFileRecord, PREVIEW_CHARS, SkippedFile, preview};
pub use operation::{OperationKind, OperationStatus, Step, StepStatus};
pub use search::{
    AdvancedSearchRequest, AdvancedSearchResult, DateRange, FacetCounts, LibraryDocument,
    SearchError, SearchFacets, SearchFilters, SortOrder, advanced_search, apply_query_relevance,
    matches_query, sort_library_by_relevance,
};
