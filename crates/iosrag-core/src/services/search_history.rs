//! Search history and named saved searches.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::SearchFilters;

/// Maximum number of history entries kept.
pub const HISTORY_CAPACITY: usize = 100;

/// Default number of entries returned by `get_search_history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// One executed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub query: String,
    pub filters: SearchFilters,
    pub result_count: usize,
    pub searched_at: DateTime<Utc>,
}

/// A search stored under a name for later reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub name: String,
    pub query: String,
    pub filters: SearchFilters,
    pub saved_at: DateTime<Utc>,
}

#[derive(Default)]
struct HistoryState {
    entries: VecDeque<SearchHistoryEntry>,
    saved: Vec<SavedSearch>,
}

/// Process-wide record of searches, newest first.
#[derive(Default)]
pub struct SearchHistory {
    state: Mutex<HistoryState>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record a completed search, evicting the oldest entry past capacity.
    pub fn record(&self, query: &str, filters: &SearchFilters, result_count: usize) {
        let mut state = self.lock();
        state.entries.push_front(SearchHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.to_string(),
            filters: filters.clone(),
            result_count,
            searched_at: Utc::now(),
        });
        state.entries.truncate(HISTORY_CAPACITY);
    }

    /// Most recent entries first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<SearchHistoryEntry> {
        self.lock().entries.iter().take(limit).cloned().collect()
    }

    /// Save a search under `name`, replacing an earlier one with that name.
    pub fn save(&self, name: &str, query: &str, filters: &SearchFilters) {
        let mut state = self.lock();
        state.saved.retain(|s| s.name != name);
        state.saved.push(SavedSearch {
            name: name.to_string(),
            query: query.to_string(),
            filters: filters.clone(),
            saved_at: Utc::now(),
        });
    }

    pub fn saved(&self) -> Vec<SavedSearch> {
        self.lock().saved.clone()
    }
}
