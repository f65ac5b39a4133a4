//! `DocumentCatalog` backed by static tables.

use async_trait::async_trait;
use chrono::Utc;
use iosrag_core::ports::{CatalogError, DocumentCatalog, DocumentContent, FetchedDocument};
use iosrag_core::{DocumentRecord, LibraryDocument};
use tracing::debug;

use crate::config::CatalogConfig;
use crate::{library, sites};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Deterministic catalog: every answer is derived from the query text.
///
/// Searches and fetches never leave the process. A non-zero latency in the
/// config makes each call sleep, which is how the demo paces itself.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentCatalog {
    config: CatalogConfig,
}

impl StaticDocumentCatalog {
    pub const fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

/// Parse a display size such as `2.4 MB` into bytes.
fn size_to_bytes(size: &str) -> Option<u64> {
    let megabytes: f64 = size.strip_suffix(" MB")?.trim().parse().ok()?;
    (megabytes >= 0.0).then(|| (megabytes * BYTES_PER_MB).round() as u64)
}

#[async_trait]
impl DocumentCatalog for StaticDocumentCatalog {
    fn trusted_sources(&self) -> Vec<String> {
        self.config.trusted_sources.clone()
    }

    async fn search_site(
        &self,
        query: &str,
        site: &str,
    ) -> Result<Vec<DocumentRecord>, CatalogError> {
        if site.trim().is_empty() {
            return Err(CatalogError::SourceFailed {
                site: site.to_string(),
                reason: "empty site name".to_string(),
            });
        }
        self.simulate_latency().await;
        let docs = sites::site_documents(query, site);
        debug!(target: "iosrag.catalog", query, site, found = docs.len(), "Site searched");
        Ok(docs)
    }

    async fn search_web(&self, query: &str) -> Result<Vec<DocumentRecord>, CatalogError> {
        self.simulate_latency().await;
        Ok(sites::web_documents(query))
    }

    async fn library(&self) -> Result<Vec<LibraryDocument>, CatalogError> {
        Ok(library::library_documents())
    }

    async fn document_content(&self, id: &str) -> Result<DocumentContent, CatalogError> {
        let document = library::find(id).ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        self.simulate_latency().await;
        Ok(DocumentContent {
            content: format!(
                "This is the content of {}. In a real implementation, this would contain the \
                 actual document text.",
                document.title
            ),
            content_type: "text/plain".to_string(),
            retrieved_at: Utc::now(),
            document,
        })
    }

    async fn fetch(&self, document: &DocumentRecord) -> Result<FetchedDocument, CatalogError> {
        let location = document.location();
        if location.is_empty() {
            return Err(CatalogError::FetchFailed {
                location: document.title.clone(),
                reason: "document has no URL or path".to_string(),
            });
        }
        self.simulate_latency().await;

        let file_name = format!("{}.pdf", document.derived_id());
        let local_path = self.config.download_dir.join(file_name);
        Ok(FetchedDocument {
            local_path: local_path.display().to_string(),
            size_bytes: size_to_bytes(&document.size).unwrap_or(0),
        })
    }

    fn suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        library::suggestions(partial, limit)
    }
}
