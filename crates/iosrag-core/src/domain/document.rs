//! Document records produced by discovery, the AI agent and downloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::{content_hash, short_id};

/// Download lifecycle of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    #[default]
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl DownloadStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

fn default_doc_type() -> String {
    "PDF".to_string()
}

/// A discovered or downloadable document.
///
/// The `id` is derived from location, title and source so the same document
/// found twice always collapses to the same identifier. Records arriving from
/// clients may omit it; [`DocumentRecord::with_derived_id`] restores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub summary: String,
    /// Relevance score in `[0, 1]`.
    #[serde(default)]
    pub relevance: f64,
    #[serde(default)]
    pub download_status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_new: bool,
}

impl DocumentRecord {
    /// Create a pending PDF record located at `url`.
    pub fn new(title: impl Into<String>, source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            source: source.into(),
            url: Some(url.into()),
            local_path: None,
            doc_type: default_doc_type(),
            size: String::new(),
            summary: String::new(),
            relevance: 0.0,
            download_status: DownloadStatus::Pending,
            rank: None,
            validated: false,
            validation_date: None,
            discovered_at: None,
            downloaded_at: None,
            is_new: false,
        }
        .with_derived_id()
    }

    /// Where the document lives: its URL, else its local path.
    pub fn location(&self) -> &str {
        self.url
            .as_deref()
            .or(self.local_path.as_deref())
            .unwrap_or_default()
    }

    /// De-duplication key of record, derived from location, title and source.
    pub fn content_hash(&self) -> String {
        content_hash(&[self.location(), &self.title, &self.source])
    }

    /// Stable identifier derived from the same parts as the content hash.
    pub fn derived_id(&self) -> String {
        short_id(&[self.location(), &self.title, &self.source])
    }

    /// Fill `id` from the derived identifier when it is empty.
    #[must_use]
    pub fn with_derived_id(mut self) -> Self {
        if self.id.is_empty() {
            self.id = self.derived_id();
        }
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    #[must_use]
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance.clamp(0.0, 1.0);
        self
    }
}

/// Sort documents by relevance, highest first. Ties keep their input order.
pub fn sort_by_relevance(documents: &mut [DocumentRecord]) {
    documents.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents_share_id_and_hash() {
        let a = DocumentRecord::new("BGP Guide", "cisco.com", "https://cisco.com/bgp.pdf");
        let b = DocumentRecord::new("BGP Guide", "cisco.com", "https://cisco.com/bgp.pdf");
        assert_eq!(a.id, b.id);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_different_source_changes_id() {
        let a = DocumentRecord::new("BGP Guide", "cisco.com", "https://cisco.com/bgp.pdf");
        let b = DocumentRecord::new("BGP Guide", "ine.com", "https://cisco.com/bgp.pdf");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_client_record_without_id_gets_derived_id() {
        let json = r#"{"title":"OSPF","source":"ine.com","url":"https://ine.com/ospf.pdf"}"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert!(record.id.is_empty());
        let record = record.with_derived_id();
        assert_eq!(record.id, record.derived_id());
        assert_eq!(record.doc_type, "PDF");
        assert_eq!(record.download_status, DownloadStatus::Pending);
    }

    #[test]
    fn test_location_falls_back_to_local_path() {
        let mut record = DocumentRecord::new("Notes", "local", "");
        record.url = None;
        record.local_path = Some("/tmp/notes.txt".to_string());
        assert_eq!(record.location(), "/tmp/notes.txt");
    }

    #[test]
    fn test_sort_by_relevance_descending() {
        let mut docs = vec![
            DocumentRecord::new("a", "s", "u1").with_relevance(0.5),
            DocumentRecord::new("b", "s", "u2").with_relevance(0.9),
            DocumentRecord::new("c", "s", "u3").with_relevance(0.7),
        ];
        sort_by_relevance(&mut docs);
        let titles: Vec<_> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let record = DocumentRecord::new("a", "s", "https://s/a.pdf");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "PDF");
        assert_eq!(value["download_status"], "pending");
        assert!(value.get("is_new").is_none());
    }
}
