//! Indexed-library search: filters, query scoring, facets and date ranges.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A document already indexed in the local library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryDocument {
    pub id: String,
    pub title: String,
    pub source: String,
    pub relevance_score: f64,
    pub document_type: String,
    pub certification_level: Vec<String>,
    pub summary: String,
    pub local_path: String,
    pub page_references: Vec<u32>,
    pub date_added: NaiveDate,
    pub software_type: String,
}

fn default_all() -> String {
    "all".to_string()
}

const fn default_threshold() -> f64 {
    70.0
}

fn default_software_type() -> String {
    "Cisco IOS".to_string()
}

/// Filters applied by the streaming search operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Minimum base relevance in percent (0-100).
    #[serde(default = "default_threshold")]
    pub relevance_threshold: f64,
    #[serde(default = "default_all")]
    pub cert_level: String,
    #[serde(default = "default_all")]
    pub doc_type: String,
    #[serde(default = "default_software_type")]
    pub software_type: String,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            relevance_threshold: default_threshold(),
            cert_level: default_all(),
            doc_type: default_all(),
            software_type: default_software_type(),
        }
    }
}

fn is_all(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

impl SearchFilters {
    pub fn matches(&self, doc: &LibraryDocument) -> bool {
        if doc.relevance_score * 100.0 < self.relevance_threshold {
            return false;
        }
        if !is_all(&self.cert_level)
            && !doc
                .certification_level
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&self.cert_level))
        {
            return false;
        }
        if !is_all(&self.doc_type) && doc.document_type != self.doc_type {
            return false;
        }
        if !is_all(&self.software_type)
            && !doc
                .software_type
                .to_lowercase()
                .contains(&self.software_type.to_lowercase())
        {
            return false;
        }
        true
    }
}

/// Boost relevance by how many query words appear in title (0.3) and summary (0.1).
///
/// Scores are capped at 1.0. An empty query leaves scores untouched.
pub fn apply_query_relevance(docs: &mut [LibraryDocument], query: &str) {
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return;
    }
    let total = words.len() as f64;

    for doc in docs {
        let title = doc.title.to_lowercase();
        let summary = doc.summary.to_lowercase();
        let title_words: Vec<&str> = title.split_whitespace().collect();
        let summary_words: Vec<&str> = summary.split_whitespace().collect();

        let hits = |haystack: &[&str]| {
            words
                .iter()
                .filter(|w| haystack.iter().any(|h| h.contains(w.as_str())))
                .count() as f64
        };

        let boost = hits(&title_words) / total * 0.3 + hits(&summary_words) / total * 0.1;
        doc.relevance_score = (doc.relevance_score + boost).min(1.0);
    }
}

/// Whether any query word occurs in the title or summary.
pub fn matches_query(doc: &LibraryDocument, query: &str) -> bool {
    let title = doc.title.to_lowercase();
    let summary = doc.summary.to_lowercase();
    let mut words = query.split_whitespace().peekable();
    if words.peek().is_none() {
        return true;
    }
    words
        .map(str::to_lowercase)
        .any(|w| title.contains(&w) || summary.contains(&w))
}

pub fn sort_library_by_relevance(docs: &mut [LibraryDocument]) {
    docs.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Unknown date range: {0}")]
    UnknownDateRange(String),
}

/// Relative window on `date_added`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    All,
    LastDays(i64),
}

impl DateRange {
    pub fn parse(value: Option<&str>) -> Result<Self, SearchError> {
        match value.map(str::trim) {
            None | Some("" | "all") => Ok(Self::All),
            Some("last_7_days") => Ok(Self::LastDays(7)),
            Some("last_30_days") => Ok(Self::LastDays(30)),
            Some("last_90_days") => Ok(Self::LastDays(90)),
            Some("last_year") => Ok(Self::LastDays(365)),
            Some(other) => Err(SearchError::UnknownDateRange(other.to_string())),
        }
    }

    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::LastDays(days) => date >= today - Duration::days(days),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Date,
    Title,
}

/// Optional facet constraints for advanced search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFacets {
    #[serde(default)]
    pub cert_level: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub software_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

fn wanted(facet: &Option<String>) -> Option<&str> {
    facet.as_deref().filter(|v| !is_all(v))
}

impl SearchFacets {
    fn matches(&self, doc: &LibraryDocument) -> bool {
        if let Some(cert) = wanted(&self.cert_level) {
            if !doc.certification_level.iter().any(|c| c.eq_ignore_ascii_case(cert)) {
                return false;
            }
        }
        if let Some(doc_type) = wanted(&self.doc_type) {
            if doc.document_type != doc_type {
                return false;
            }
        }
        if let Some(software) = wanted(&self.software_type) {
            if !doc.software_type.eq_ignore_ascii_case(software) {
                return false;
            }
        }
        if let Some(source) = wanted(&self.source) {
            if doc.source != source {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub facets: SearchFacets,
    #[serde(default)]
    pub date_range: Option<String>,
    #[serde(default)]
    pub sort_by: SortOrder,
}

/// Value counts per facet field over a result set.
pub type FacetCounts = BTreeMap<String, BTreeMap<String, usize>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSearchResult {
    pub results: Vec<LibraryDocument>,
    pub facets: FacetCounts,
    pub total: usize,
    pub sort_by: SortOrder,
}

fn facet_counts(docs: &[LibraryDocument]) -> FacetCounts {
    let mut counts = FacetCounts::new();
    for doc in docs {
        let mut bump = |field: &str, value: &str| {
            *counts
                .entry(field.to_string())
                .or_default()
                .entry(value.to_string())
                .or_default() += 1;
        };
        bump("document_type", &doc.document_type);
        bump("software_type", &doc.software_type);
        bump("source", &doc.source);
        for cert in &doc.certification_level {
            bump("certification_level", cert);
        }
    }
    counts
}

/// Run a faceted search over `library`.
pub fn advanced_search(
    library: Vec<LibraryDocument>,
    request: &AdvancedSearchRequest,
    today: NaiveDate,
) -> Result<AdvancedSearchResult, SearchError> {
    let range = DateRange::parse(request.date_range.as_deref())?;

    let mut results: Vec<LibraryDocument> = library
        .into_iter()
        .filter(|doc| matches_query(doc, &request.query))
        .filter(|doc| request.facets.matches(doc))
        .filter(|doc| range.contains(doc.date_added, today))
        .collect();

    apply_query_relevance(&mut results, &request.query);

    match request.sort_by {
        SortOrder::Relevance => sort_library_by_relevance(&mut results),
        SortOrder::Date => results.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
        SortOrder::Title => results.sort_by(|a, b| a.title.cmp(&b.title)),
    }

    Ok(AdvancedSearchResult {
        facets: facet_counts(&results),
        total: results.len(),
        sort_by: request.sort_by,
        results,
    })
}
