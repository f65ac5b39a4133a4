//! Static document catalog and canned LLM client.
//!
//! Both stand in for real search and model backends behind the core ports,
//! returning deterministic data derived from the request text.
#![deny(unused_crate_dependencies)]

mod catalog;
mod config;
mod library;
mod llm;
mod sites;

pub use catalog::StaticDocumentCatalog;
pub use config::{CatalogConfig, DEFAULT_TRUSTED_SOURCES};
pub use llm::CannedLlmClient;
