//! Outbound messages sent to clients.
//!
//! Every message serializes as a JSON object with a `type` discriminator.
//! The transport adds a `timestamp` when the message has none.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::SystemConfig;
use crate::domain::{AdvancedSearchResult, OperationKind, OperationStatus, Step};
use crate::ports::DocumentContent;
use crate::services::{
    ConfigReply, LlmTestReport, PipelineSnapshot, SavedSearch, SearchHistoryEntry, SystemStatus,
    UpdateCheckReport,
};

/// "Starting" notice sent before an operation's first update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusNotice {
    pub status: String,
    pub message: String,
}

impl StatusNotice {
    pub fn starting(message: impl Into<String>) -> Self {
        Self {
            status: "starting".to_string(),
            message: message.into(),
        }
    }
}

/// Snapshot of an in-flight operation.
///
/// Task-specific fields (documents, counters, stage numbers) are flattened
/// into the top level next to the common ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationUpdate {
    pub operation_id: String,
    pub operation: OperationKind,
    pub status: OperationStatus,
    /// Overall progress, 0-100.
    pub progress: f64,
    /// Identifier of the current step.
    pub step: String,
    /// Human-readable description of the current step.
    pub current_step: String,
    pub steps: Vec<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Every message type the server sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Error { message: String },

    DiscoveryStatus(StatusNotice),
    LocalFilesStatus(StatusNotice),
    SearchStatus(StatusNotice),
    AiAgentStatus(StatusNotice),
    PipelineStage1Status(StatusNotice),
    PipelineStage2Status(StatusNotice),

    DiscoveryUpdate(OperationUpdate),
    LocalFilesUpdate(OperationUpdate),
    SearchUpdate(OperationUpdate),
    SearchResults(OperationUpdate),
    AiAgentUpdate(OperationUpdate),
    PipelineStage1Update(OperationUpdate),
    PipelineStage2Update(OperationUpdate),
    DocumentDownloadUpdate(OperationUpdate),

    ConfigUpdated { result: Box<ConfigReply> },
    ConfigChanged { config: Box<SystemConfig> },
    SystemStatus { status: Box<SystemStatus> },
    LlmTestResults(LlmTestReport),
    DocumentUpdatesChecked { result: UpdateCheckReport },
    SearchHistory { result: Vec<SearchHistoryEntry> },
    SavedSearches { result: Vec<SavedSearch> },
    AdvancedSearchResults { result: AdvancedSearchResult },
    SearchSuggestions { query: String, suggestions: Vec<String> },
    DocumentContent { result: Box<DocumentContent> },
    PipelineStatus { result: PipelineSnapshot },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// "Starting" notice for `kind`, if that kind has one.
    pub fn starting(kind: OperationKind, message: impl Into<String>) -> Option<Self> {
        let notice = StatusNotice::starting(message);
        match kind {
            OperationKind::Discovery => Some(Self::DiscoveryStatus(notice)),
            OperationKind::LocalFileIngest => Some(Self::LocalFilesStatus(notice)),
            OperationKind::Search => Some(Self::SearchStatus(notice)),
            OperationKind::AiAgent => Some(Self::AiAgentStatus(notice)),
            OperationKind::PipelineStage1 => Some(Self::PipelineStage1Status(notice)),
            OperationKind::PipelineStage2 => Some(Self::PipelineStage2Status(notice)),
            OperationKind::DocumentDownload => None,
        }
    }

    /// Wrap an operation snapshot in the message type clients expect for `kind`.
    ///
    /// Search reports progress as `search_update` and its completion as
    /// `search_results`; every other kind uses one type for the whole stream.
    pub fn operation(update: OperationUpdate) -> Self {
        match update.operation {
            OperationKind::Discovery => Self::DiscoveryUpdate(update),
            OperationKind::LocalFileIngest => Self::LocalFilesUpdate(update),
            OperationKind::Search if update.status == OperationStatus::Completed => {
                Self::SearchResults(update)
            }
            OperationKind::Search => Self::SearchUpdate(update),
            OperationKind::AiAgent => Self::AiAgentUpdate(update),
            OperationKind::PipelineStage1 => Self::PipelineStage1Update(update),
            OperationKind::PipelineStage2 => Self::PipelineStage2Update(update),
            OperationKind::DocumentDownload => Self::DocumentDownloadUpdate(update),
        }
    }

    /// The `type` discriminator, for logging.
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::DiscoveryStatus(_) => "discovery_status",
            Self::LocalFilesStatus(_) => "local_files_status",
            Self::SearchStatus(_) => "search_status",
            Self::AiAgentStatus(_) => "ai_agent_status",
            Self::PipelineStage1Status(_) => "pipeline_stage1_status",
            Self::PipelineStage2Status(_) => "pipeline_stage2_status",
            Self::DiscoveryUpdate(_) => "discovery_update",
            Self::LocalFilesUpdate(_) => "local_files_update",
            Self::SearchUpdate(_) => "search_update",
            Self::SearchResults(_) => "search_results",
            Self::AiAgentUpdate(_) => "ai_agent_update",
            Self::PipelineStage1Update(_) => "pipeline_stage1_update",
            Self::PipelineStage2Update(_) => "pipeline_stage2_update",
            Self::DocumentDownloadUpdate(_) => "document_download_update",
            Self::ConfigUpdated { .. } => "config_updated",
            Self::ConfigChanged { .. } => "config_changed",
            Self::SystemStatus { .. } => "system_status",
            Self::LlmTestResults(_) => "llm_test_results",
            Self::DocumentUpdatesChecked { .. } => "document_updates_checked",
            Self::SearchHistory { .. } => "search_history",
            Self::SavedSearches { .. } => "saved_searches",
            Self::AdvancedSearchResults { .. } => "advanced_search_results",
            Self::SearchSuggestions { .. } => "search_suggestions",
            Self::DocumentContent { .. } => "document_content",
            Self::PipelineStatus { .. } => "pipeline_status",
        }
    }

    /// The operation snapshot carried by this event, if any.
    pub const fn as_update(&self) -> Option<&OperationUpdate> {
        match self {
            Self::DiscoveryUpdate(u)
            | Self::LocalFilesUpdate(u)
            | Self::SearchUpdate(u)
            | Self::SearchResults(u)
            | Self::AiAgentUpdate(u)
            | Self::PipelineStage1Update(u)
            | Self::PipelineStage2Update(u)
            | Self::DocumentDownloadUpdate(u) => Some(u),
            _ => None,
        }
    }

    /// Serialize to a JSON object.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
