//! In-memory implementation of the `DocumentRepository` trait.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use iosrag_core::{
    DocumentRecord, DocumentRepository, DownloadStatus, LocalFileRecord, RepositoryError,
};

#[derive(Default)]
struct State {
    discovered_hashes: HashSet<String>,
    downloaded_hashes: HashSet<String>,
    discovered: Vec<DocumentRecord>,
    local_files: Vec<LocalFileRecord>,
}

/// Process-wide document state shared by every connection.
///
/// One lock guards both hash sets and both lists, so every check-and-insert
/// is atomic with respect to concurrent operations. Nothing survives a
/// restart.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    state: Mutex<State>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn claim_discovered(
        &self,
        candidates: Vec<DocumentRecord>,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let mut state = self.state();
        let mut claimed = Vec::with_capacity(limit.min(candidates.len()));
        let mut duplicates = 0usize;
        for doc in candidates {
            if claimed.len() >= limit {
                break;
            }
            if state.discovered_hashes.insert(doc.content_hash()) {
                claimed.push(doc);
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::debug!(
                target: "iosrag.store",
                duplicates,
                claimed = claimed.len(),
                "Skipped already discovered documents"
            );
        }
        Ok(claimed)
    }

    async fn store_discovered(&self, documents: &[DocumentRecord]) -> Result<(), RepositoryError> {
        self.state().discovered = documents.to_vec();
        Ok(())
    }

    async fn discovered(&self) -> Result<Vec<DocumentRecord>, RepositoryError> {
        Ok(self.state().discovered.clone())
    }

    async fn is_downloaded(&self, content_hash: &str) -> Result<bool, RepositoryError> {
        Ok(self.state().downloaded_hashes.contains(content_hash))
    }

    async fn mark_downloaded(&self, document: &DocumentRecord) -> Result<bool, RepositoryError> {
        let hash = document.content_hash();
        let mut state = self.state();
        if !state.downloaded_hashes.insert(hash.clone()) {
            return Ok(false);
        }
        let downloaded_at = document.downloaded_at.unwrap_or_else(Utc::now);
        for record in state
            .discovered
            .iter_mut()
            .filter(|r| r.content_hash() == hash)
        {
            record.download_status = DownloadStatus::Completed;
            record.downloaded_at = Some(downloaded_at);
            record.local_path.clone_from(&document.local_path);
        }
        Ok(true)
    }

    async fn store_local_file(&self, file: LocalFileRecord) -> Result<(), RepositoryError> {
        self.state().local_files.push(file);
        Ok(())
    }

    async fn local_files(&self) -> Result<Vec<LocalFileRecord>, RepositoryError> {
        Ok(self.state().local_files.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn doc(n: usize) -> DocumentRecord {
        DocumentRecord::new(
            format!("Guide {n}"),
            "cisco.com",
            format!("https://cisco.com/{n}.pdf"),
        )
    }

    #[tokio::test]
    async fn test_claim_skips_known_hashes_and_respects_limit() {
        let repo = InMemoryDocumentRepository::new();
        let first = repo.claim_discovered(vec![doc(1), doc(2)], 1).await.unwrap();
        assert_eq!(first, vec![doc(1)]);

        let second = repo
            .claim_discovered(vec![doc(1), doc(2), doc(3)], 5)
            .await
            .unwrap();
        assert_eq!(second, vec![doc(2), doc(3)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_never_double_count() {
        let repo = Arc::new(InMemoryDocumentRepository::new());
        let candidates: Vec<_> = (0..20).map(doc).collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let candidates = candidates.clone();
                tokio::spawn(async move { repo.claim_discovered(candidates, 20).await.unwrap() })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().len();
        }
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn test_mark_downloaded_updates_discovered_record() {
        let repo = InMemoryDocumentRepository::new();
        let record = doc(7);
        repo.store_discovered(std::slice::from_ref(&record))
            .await
            .unwrap();

        let mut downloaded = record.clone();
        downloaded.local_path = Some("/data/downloads/7.pdf".to_string());
        assert!(repo.mark_downloaded(&downloaded).await.unwrap());
        assert!(!repo.mark_downloaded(&downloaded).await.unwrap());
        assert!(repo.is_downloaded(&record.content_hash()).await.unwrap());

        let stored = &repo.discovered().await.unwrap()[0];
        assert_eq!(stored.download_status, DownloadStatus::Completed);
        assert!(stored.downloaded_at.is_some());
        assert_eq!(stored.local_path.as_deref(), Some("/data/downloads/7.pdf"));
    }

    #[tokio::test]
    async fn test_latest_run_replaces_discovered_list() {
        let repo = InMemoryDocumentRepository::new();
        let first = repo.claim_discovered(vec![doc(1), doc(2)], 2).await.unwrap();
        repo.store_discovered(&first).await.unwrap();
        let second = repo.claim_discovered(vec![doc(3)], 2).await.unwrap();
        repo.store_discovered(&second).await.unwrap();
        assert_eq!(repo.discovered().await.unwrap(), vec![doc(3)]);

        // Hashes from earlier runs still block rediscovery.
        let again = repo.claim_discovered(vec![doc(1), doc(2)], 2).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_download_and_discovery_sets_are_independent() {
        let repo = InMemoryDocumentRepository::new();
        repo.mark_downloaded(&doc(1)).await.unwrap();
        let claimed = repo.claim_discovered(vec![doc(1)], 1).await.unwrap();
        assert_eq!(claimed.len(), 1);
    }
}
