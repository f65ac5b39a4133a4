//! Aggregate system status: configuration, resources, documents, connections.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PipelineSnapshot;
use crate::config::SystemConfig;
use crate::domain::DownloadStatus;
use crate::ports::{CapacityUsage, CoreError, DocumentRepository, SystemProbePort, SystemResources};

/// Names of the services reported by status and health endpoints.
pub const SERVICE_NAMES: [&str; 5] = [
    "document_discovery",
    "document_search",
    "ai_agent",
    "pipeline_manager",
    "system_config",
];

/// Every service marked `active`.
pub fn service_map() -> BTreeMap<String, String> {
    SERVICE_NAMES
        .iter()
        .map(|name| ((*name).to_string(), "active".to_string()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub discovered: usize,
    pub downloaded: usize,
    pub pending: usize,
    pub local_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Masked configuration.
    pub config: SystemConfig,
    pub resources: SystemResources,
    pub services: BTreeMap<String, String>,
    pub storage: CapacityUsage,
    pub documents: DocumentCounts,
    pub connections: usize,
    pub pipeline: PipelineSnapshot,
}

pub struct StatusService {
    probe: Arc<dyn SystemProbePort>,
    repository: Arc<dyn DocumentRepository>,
}

impl StatusService {
    pub fn new(probe: Arc<dyn SystemProbePort>, repository: Arc<dyn DocumentRepository>) -> Self {
        Self { probe, repository }
    }

    pub async fn document_counts(&self) -> Result<DocumentCounts, CoreError> {
        let discovered = self.repository.discovered().await?;
        let local_files = self.repository.local_files().await?.len();
        let downloaded = discovered
            .iter()
            .filter(|d| d.download_status == DownloadStatus::Completed)
            .count();
        Ok(DocumentCounts {
            discovered: discovered.len(),
            downloaded,
            pending: discovered.len() - downloaded,
            local_files,
        })
    }

    pub async fn status(
        &self,
        config: &SystemConfig,
        pipeline: PipelineSnapshot,
        connections: usize,
    ) -> Result<SystemStatus, CoreError> {
        Ok(SystemStatus {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            config: config.masked(),
            resources: self.probe.resources(),
            services: service_map(),
            storage: self.probe.storage(),
            documents: self.document_counts().await?,
            connections,
            pipeline,
        })
    }
}
