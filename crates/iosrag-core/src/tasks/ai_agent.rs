//! AI agent: turn a free-text request into a curated download list.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{default_all, default_max_documents, queries};
use crate::domain::{DocumentRecord, DownloadStatus, OperationKind, sort_by_relevance};
use crate::ports::{DocumentCatalog, DocumentRepository};
use crate::runner::{OperationError, OperationTask, StepContext, StepDef};

const STEPS: [StepDef; 5] = [
    StepDef::fixed("initialize", "Initializing AI agent", 20.0, 40.0),
    StepDef::fixed("generate_queries", "Generating search strategies", 40.0, 60.0),
    StepDef::fixed("search", "Searching the web", 60.0, 80.0),
    StepDef::fixed("refine", "Refining results", 80.0, 90.0),
    StepDef::fixed("download", "Preparing downloads", 90.0, 100.0),
];

/// Floor applied to the relevance of every agent-selected document.
const MIN_AGENT_RELEVANCE: f64 = 0.8;

/// Hard cap on documents returned by one agent run.
const MAX_AGENT_RESULTS: usize = 12;

#[derive(Debug, Clone, Deserialize)]
pub struct AiAgentRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_all")]
    pub certification_level: String,
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

pub struct AiAgentTask {
    request: AiAgentRequest,
    catalog: Arc<dyn DocumentCatalog>,
    repository: Arc<dyn DocumentRepository>,
    queries: Vec<String>,
    found: Vec<DocumentRecord>,
}

impl AiAgentTask {
    pub fn new(
        request: AiAgentRequest,
        catalog: Arc<dyn DocumentCatalog>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Result<Self, OperationError> {
        if request.query.trim().is_empty() {
            return Err(OperationError::Input(
                "Query is required for the AI agent".to_string(),
            ));
        }
        Ok(Self {
            request,
            catalog,
            repository,
            queries: Vec::new(),
            found: Vec::new(),
        })
    }

    async fn search(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let total = self.queries.len();
        for (index, query) in self.queries.iter().enumerate() {
            match self.catalog.search_web(query).await {
                Ok(docs) => self.found.extend(docs),
                Err(e) => warn!(
                    target: "iosrag.agent",
                    query = %query,
                    error = %e,
                    "Web search failed, skipping"
                ),
            }
            ctx.advance(
                (index + 1) as f64 / total as f64,
                format!("Searching: {query}"),
            )?;
            ctx.pace(0.4).await?;
        }
        ctx.set_detail(format!("Found {} documents", self.found.len()));
        Ok(())
    }

    async fn refine(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let mut seen = HashSet::new();
        let mut refined: Vec<DocumentRecord> = std::mem::take(&mut self.found)
            .into_iter()
            .filter(|doc| seen.insert(doc.location().to_string()))
            .map(|mut doc| {
                doc.relevance = doc.relevance.max(MIN_AGENT_RELEVANCE);
                doc
            })
            .collect();
        sort_by_relevance(&mut refined);
        refined.truncate(
            self.request
                .max_documents
                .saturating_mul(2)
                .min(MAX_AGENT_RESULTS),
        );

        let mut fresh = Vec::with_capacity(refined.len());
        for mut doc in refined {
            if self.repository.is_downloaded(&doc.content_hash()).await? {
                continue;
            }
            doc.is_new = true;
            doc.download_status = DownloadStatus::Pending;
            fresh.push(doc);
        }
        ctx.set_detail(format!("{} new documents selected", fresh.len()));
        self.found = fresh;
        Ok(())
    }
}

#[async_trait]
impl OperationTask for AiAgentTask {
    fn kind(&self) -> OperationKind {
        OperationKind::AiAgent
    }

    fn steps(&self) -> Vec<StepDef> {
        STEPS.to_vec()
    }

    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError> {
        match step.id.as_ref() {
            "initialize" => ctx.set_detail(format!("Request: {}", self.request.query)),
            "generate_queries" => {
                self.queries =
                    queries::agent_queries(&self.request.query, &self.request.certification_level);
                ctx.set_field("queries", &self.queries)?;
                ctx.set_detail(format!("Generated {} search strategies", self.queries.len()));
            }
            "search" => self.search(ctx).await?,
            "refine" => self.refine(ctx).await?,
            "download" => {
                ctx.set_results(&self.found)?;
                ctx.set_detail(format!("{} documents ready to download", self.found.len()));
            }
            other => return Err(OperationError::Internal(format!("Unknown step {other}"))),
        }
        ctx.pace(1.0).await
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        ctx.set_message(format!(
            "AI agent found {} documents for '{}'",
            self.found.len(),
            self.request.query
        ));
        Ok(())
    }
}
