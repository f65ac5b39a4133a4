//! Operations, steps and their lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The long-running operations a client can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Discovery,
    LocalFileIngest,
    Search,
    AiAgent,
    PipelineStage1,
    PipelineStage2,
    DocumentDownload,
}

impl OperationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::LocalFileIngest => "local_file_ingest",
            Self::Search => "search",
            Self::AiAgent => "ai_agent",
            Self::PipelineStage1 => "pipeline_stage1",
            Self::PipelineStage2 => "pipeline_stage2",
            Self::DocumentDownload => "document_download",
        }
    }

    /// Message type of the "starting" notice sent before the first update.
    ///
    /// Downloads have no notice; their first update already says `downloading`.
    pub const fn status_type(self) -> Option<&'static str> {
        match self {
            Self::Discovery => Some("discovery_status"),
            Self::LocalFileIngest => Some("local_files_status"),
            Self::Search => Some("search_status"),
            Self::AiAgent => Some("ai_agent_status"),
            Self::PipelineStage1 => Some("pipeline_stage1_status"),
            Self::PipelineStage2 => Some("pipeline_stage2_status"),
            Self::DocumentDownload => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a whole operation.
///
/// On the wire a failed operation reports `error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Pending,
    Running,
    Completed,
    #[serde(rename = "error")]
    Failed,
}

impl OperationStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Lifecycle of a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// A named unit of work inside an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
    /// Local progress of this step, 0-100.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Step {
    pub fn pending(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status: StepStatus::Pending,
            progress: 0.0,
            details: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = StepStatus::Running;
        self.progress = 0.0;
    }

    pub(crate) fn complete(&mut self) {
        self.status = StepStatus::Completed;
        self.progress = 100.0;
    }

    pub(crate) fn fail(&mut self, details: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.details = Some(details.into());
    }
}
