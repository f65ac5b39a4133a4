//! Port implementations backed by a JSON file and process memory.

mod json_config_store;
mod memory_document_repository;

pub use json_config_store::JsonConfigStore;
pub use memory_document_repository::InMemoryDocumentRepository;
