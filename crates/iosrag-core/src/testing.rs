//! In-memory test doubles shared by the core unit tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{DocumentRecord, LibraryDocument, LocalFileRecord};
use crate::events::{OperationUpdate, ServerEvent};
use crate::ports::{
    CatalogError, DocumentCatalog, DocumentContent, DocumentRepository, ExtractError,
    ExtractedText, FetchedDocument, ProgressSink, RepositoryError, TextExtractor,
};

/// Sink that keeps every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ServerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ServerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<OperationUpdate> {
        self.events()
            .iter()
            .filter_map(ServerEvent::as_update)
            .cloned()
            .collect()
    }

    pub fn last_update(&self) -> OperationUpdate {
        self.updates().pop().unwrap()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ServerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
struct RepoState {
    discovered_hashes: HashSet<String>,
    downloaded_hashes: HashSet<String>,
    discovered: Vec<DocumentRecord>,
    local_files: Vec<LocalFileRecord>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<RepoState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn claim_discovered(
        &self,
        candidates: Vec<DocumentRecord>,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let mut claimed = Vec::new();
        for doc in candidates {
            if claimed.len() >= limit {
                break;
            }
            if state.discovered_hashes.insert(doc.content_hash()) {
                claimed.push(doc);
            }
        }
        Ok(claimed)
    }

    async fn store_discovered(&self, documents: &[DocumentRecord]) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().discovered = documents.to_vec();
        Ok(())
    }

    async fn discovered(&self) -> Result<Vec<DocumentRecord>, RepositoryError> {
        Ok(self.state.lock().unwrap().discovered.clone())
    }

    async fn is_downloaded(&self, content_hash: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .downloaded_hashes
            .contains(content_hash))
    }

    async fn mark_downloaded(&self, document: &DocumentRecord) -> Result<bool, RepositoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .downloaded_hashes
            .insert(document.content_hash()))
    }

    async fn store_local_file(&self, file: LocalFileRecord) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().local_files.push(file);
        Ok(())
    }

    async fn local_files(&self) -> Result<Vec<LocalFileRecord>, RepositoryError> {
        Ok(self.state.lock().unwrap().local_files.clone())
    }
}

/// Catalog with a small deterministic corpus.
///
/// Every site returns two documents per topic word; the site `broken.example`
/// always fails.
pub struct FixtureCatalog;

pub const BROKEN_SITE: &str = "broken.example";

impl FixtureCatalog {
    fn topic(query: &str) -> String {
        query
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

#[async_trait]
impl DocumentCatalog for FixtureCatalog {
    fn trusted_sources(&self) -> Vec<String> {
        vec!["cisco.com".to_string(), "ciscopress.com".to_string()]
    }

    async fn search_site(
        &self,
        query: &str,
        site: &str,
    ) -> Result<Vec<DocumentRecord>, CatalogError> {
        if site == BROKEN_SITE {
            return Err(CatalogError::SourceFailed {
                site: site.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        let topic = Self::topic(query);
        let bonus = if site == "cisco.com" { 0.1 } else { 0.0 };
        Ok(vec![
            DocumentRecord::new(
                format!("{topic} guide - {site}"),
                site,
                format!("https://{site}/{topic}-guide.pdf"),
            )
            .with_relevance(0.8 + bonus),
            DocumentRecord::new(
                format!("{topic} handbook - {site}"),
                site,
                format!("https://{site}/{topic}-handbook.pdf"),
            )
            .with_relevance(0.7 + bonus),
        ])
    }

    async fn search_web(&self, query: &str) -> Result<Vec<DocumentRecord>, CatalogError> {
        let slug = query.to_lowercase().replace(' ', "-");
        Ok(vec![
            DocumentRecord::new(query, "cisco.com", format!("https://cisco.com/{slug}.pdf"))
                .with_relevance(0.6),
        ])
    }

    async fn library(&self) -> Result<Vec<LibraryDocument>, CatalogError> {
        let doc = |id: &str, title: &str, relevance: f64, certs: &[&str]| LibraryDocument {
            id: id.to_string(),
            title: title.to_string(),
            source: "cisco.com".to_string(),
            relevance_score: relevance,
            document_type: "configuration".to_string(),
            certification_level: certs.iter().map(ToString::to_string).collect(),
            summary: format!("{title} summary"),
            local_path: format!("/documents/{id}.pdf"),
            page_references: vec![1],
            date_added: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            software_type: "Cisco IOS".to_string(),
        };
        Ok(vec![
            doc("1", "BGP Route Reflectors", 0.75, &["CCNP"]),
            doc("2", "OSPF Areas", 0.9, &["CCNA"]),
            doc("3", "BGP Communities", 0.5, &["CCIE"]),
        ])
    }

    async fn document_content(&self, id: &str) -> Result<DocumentContent, CatalogError> {
        Err(CatalogError::NotFound(id.to_string()))
    }

    async fn fetch(&self, document: &DocumentRecord) -> Result<FetchedDocument, CatalogError> {
        if document.source == BROKEN_SITE {
            return Err(CatalogError::FetchFailed {
                location: document.location().to_string(),
                reason: "404".to_string(),
            });
        }
        Ok(FetchedDocument {
            local_path: format!("/tmp/downloads/{}.pdf", document.id),
            size_bytes: 1024,
        })
    }

    fn suggestions(&self, _partial: &str, _limit: usize) -> Vec<String> {
        Vec::new()
    }
}

/// Extractor that reads `.txt` files and rejects files named `broken.*`.
pub struct FixtureExtractor;

#[async_trait]
impl TextExtractor for FixtureExtractor {
    fn supports(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("txt")
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.starts_with("broken.") {
            return Err(ExtractError::Parse {
                path: path.display().to_string(),
                reason: "corrupt".to_string(),
            });
        }
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if !self.supports(extension) {
            return Err(ExtractError::Unsupported(extension.to_string()));
        }
        let text = format!("contents of {name}");
        Ok(ExtractedText {
            size_bytes: text.len() as u64,
            text,
            format: "txt".to_string(),
        })
    }

    async fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        if dir.ends_with("missing") {
            return Err(ExtractError::Io {
                path: dir.display().to_string(),
                reason: "not found".to_string(),
            });
        }
        Ok(vec![dir.join("a.txt"), dir.join("b.txt")])
    }
}
