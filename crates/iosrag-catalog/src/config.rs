//! Public configuration for the static catalog.

use std::path::PathBuf;
use std::time::Duration;

/// Sites searched when a discovery request names none.
pub const DEFAULT_TRUSTED_SOURCES: [&str; 9] = [
    "cisco.com",
    "ciscopress.com",
    "ine.com",
    "cbtnuggets.com",
    "udemy.com",
    "pluralsight.com",
    "google.com",
    "google.co.za",
    "youtube.com",
];

/// Configuration for [`StaticDocumentCatalog`](crate::StaticDocumentCatalog).
///
/// # Example
///
/// ```
/// use iosrag_catalog::CatalogConfig;
/// use std::time::Duration;
///
/// let config = CatalogConfig::new()
///     .with_download_dir("/srv/iosrag/downloads")
///     .with_latency(Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Directory fetched documents are reported under.
    pub(crate) download_dir: PathBuf,
    pub(crate) trusted_sources: Vec<String>,
    /// Simulated latency of one search or fetch call.
    pub(crate) latency: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("./data/downloads"),
            trusted_sources: DEFAULT_TRUSTED_SOURCES.map(String::from).to_vec(),
            latency: Duration::ZERO,
        }
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Replace the default trusted source list.
    #[must_use]
    pub fn with_trusted_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Defaults to zero.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}
