//! Core services - the application's business logic layer.
//!
//! Services orchestrate between ports and domain logic and back the one-shot
//! request handlers. They never know which adapters sit behind the ports.

mod app_core;
mod config_service;
mod llm_tester;
mod pipeline_tracker;
mod search_history;
mod status_service;
mod update_checker;

pub use app_core::{AppCore, CoreDeps};
pub use config_service::{ConfigReply, ConfigService};
pub use llm_tester::{
    DEFAULT_QUESTIONS, LlmTestReport, LlmTestResult, LlmTestStatus, LlmTester, default_questions,
};
pub use pipeline_tracker::{
    PipelineSnapshot, PipelineTracker, Stage1Snapshot, Stage2Snapshot, StageStatus,
};
pub use search_history::{
    DEFAULT_HISTORY_LIMIT, HISTORY_CAPACITY, SavedSearch, SearchHistory, SearchHistoryEntry,
};
pub use status_service::{DocumentCounts, SERVICE_NAMES, StatusService, SystemStatus, service_map};
pub use update_checker::{StaleDocument, UpdateCheckReport, check_updates};
