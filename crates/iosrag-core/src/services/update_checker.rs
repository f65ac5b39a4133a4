//! Flags discovered documents that are old enough to need a refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DocumentRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleDocument {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub age_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheckReport {
    /// Number of documents inspected.
    pub checked: usize,
    pub updates_available: Vec<StaleDocument>,
    pub max_age_days: u32,
    pub checked_at: DateTime<Utc>,
}

/// Documents discovered more than `max_age_days` before `now`.
///
/// Documents without a discovery time were never surfaced by a discovery run
/// and are not inspected.
pub fn check_updates(
    documents: &[DocumentRecord],
    max_age_days: u32,
    now: DateTime<Utc>,
) -> UpdateCheckReport {
    let mut checked = 0;
    let mut updates_available = Vec::new();

    for doc in documents {
        let Some(discovered_at) = doc.discovered_at else {
            continue;
        };
        checked += 1;
        let age_days = (now - discovered_at).num_days();
        if age_days > i64::from(max_age_days) {
            updates_available.push(StaleDocument {
                id: doc.id.clone(),
                title: doc.title.clone(),
                url: doc.url.clone(),
                discovered_at,
                age_days,
            });
        }
    }

    UpdateCheckReport {
        checked,
        updates_available,
        max_age_days,
        checked_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discovered(title: &str, days_ago: i64, now: DateTime<Utc>) -> DocumentRecord {
        let mut doc = DocumentRecord::new(title, "cisco.com", format!("https://cisco.com/{title}.pdf"));
        doc.discovered_at = Some(now - Duration::days(days_ago));
        doc
    }

    #[test]
    fn test_flags_only_documents_past_window() {
        let now = Utc::now();
        let docs = vec![
            discovered("fresh", 10, now),
            discovered("old", 120, now),
            DocumentRecord::new("never", "cisco.com", "https://cisco.com/never.pdf"),
        ];
        let report = check_updates(&docs, 90, now);
        assert_eq!(report.checked, 2);
        assert_eq!(report.updates_available.len(), 1);
        assert_eq!(report.updates_available[0].title, "old");
        assert_eq!(report.updates_available[0].age_days, 120);
    }

    #[test]
    fn test_boundary_is_not_stale() {
        let now = Utc::now();
        let report = check_updates(&[discovered("edge", 90, now)], 90, now);
        assert!(report.updates_available.is_empty());
    }
}
