//! Process-wide document storage with content-hash de-duplication.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{DocumentRecord, LocalFileRecord};

/// Repository for discovered documents, downloads and ingested local files.
///
/// Two hash sets back de-duplication: one for documents surfaced by
/// discovery and one for completed downloads. Check-and-insert on either set
/// must be atomic with respect to concurrent callers.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Claim up to `limit` candidates whose content hash was never discovered.
    ///
    /// Candidates are considered in order. Claimed hashes are recorded before
    /// returning, so two concurrent runs never both claim the same document.
    async fn claim_discovered(
        &self,
        candidates: Vec<DocumentRecord>,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, RepositoryError>;

    /// Replace the discovered list with the documents of the latest run.
    /// The discovered-hash set is left untouched.
    async fn store_discovered(&self, documents: &[DocumentRecord]) -> Result<(), RepositoryError>;

    /// The documents surfaced by the latest discovery run, in rank order.
    async fn discovered(&self) -> Result<Vec<DocumentRecord>, RepositoryError>;

    /// Whether a document with this content hash was already downloaded.
    async fn is_downloaded(&self, content_hash: &str) -> Result<bool, RepositoryError>;

    /// Record a completed download and mark the matching discovered record.
    ///
    /// Returns `false` if the hash was already present.
    async fn mark_downloaded(&self, document: &DocumentRecord) -> Result<bool, RepositoryError>;

    /// Append an ingested local file.
    async fn store_local_file(&self, file: LocalFileRecord) -> Result<(), RepositoryError>;

    /// All ingested local files, oldest first.
    async fn local_files(&self) -> Result<Vec<LocalFileRecord>, RepositoryError>;
}
