//! Task catalog: the long-running operations clients can start.
//!
//! Each task declares its step table and implements
//! [`OperationTask`](crate::runner::OperationTask). Request types deserialize
//! straight from the `data` object of an inbound envelope.

mod ai_agent;
mod discovery;
mod download;
mod local_files;
mod pipeline;
pub mod queries;
mod search;

pub use ai_agent::{AiAgentRequest, AiAgentTask};
pub use discovery::{DiscoveryRequest, DiscoveryTask};
pub use download::{DownloadRequest, DownloadTask};
pub use local_files::{LocalFileInput, LocalFilesRequest, LocalFilesTask};
pub use pipeline::{
    STAGE1_DISCOVERED_PDFS, Stage1Request, Stage1Task, Stage2Request, Stage2Task, phase_steps,
    synthetic_increment,
};
pub use search::{SearchRequest, SearchTask};

fn default_all() -> String {
    "all".to_string()
}

const fn default_max_documents() -> usize {
    4
}
