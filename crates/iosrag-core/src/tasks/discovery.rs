//! Document discovery across trusted sources.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use super::{default_all, default_max_documents, queries};
use crate::domain::{DocumentRecord, OperationKind, sort_by_relevance};
use crate::ports::{DocumentCatalog, DocumentRepository};
use crate::runner::{OperationError, OperationTask, StepContext, StepDef};

const STEPS: [StepDef; 5] = [
    StepDef::fixed("initialize", "Initializing document discovery", 0.0, 20.0),
    StepDef::fixed("generate_queries", "Generating search queries", 20.0, 40.0),
    StepDef::fixed("search_sources", "Searching trusted sources", 40.0, 70.0),
    StepDef::fixed("validate", "Validating document links", 70.0, 90.0),
    StepDef::fixed("download", "Organizing discovered documents", 90.0, 100.0),
];

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_all")]
    pub certification_level: String,
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
    /// Sites to search; empty means the catalog's trusted list.
    #[serde(default)]
    pub sources: Vec<String>,
}

pub struct DiscoveryTask {
    request: DiscoveryRequest,
    catalog: Arc<dyn DocumentCatalog>,
    repository: Arc<dyn DocumentRepository>,
    sources: Vec<String>,
    queries: Vec<String>,
    found: Vec<DocumentRecord>,
    documents: Vec<DocumentRecord>,
}

impl DiscoveryTask {
    pub fn new(
        request: DiscoveryRequest,
        catalog: Arc<dyn DocumentCatalog>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Result<Self, OperationError> {
        if request.topic.trim().is_empty() {
            return Err(OperationError::Input(
                "Topic is required for document discovery".to_string(),
            ));
        }
        Ok(Self {
            request,
            catalog,
            repository,
            sources: Vec::new(),
            queries: Vec::new(),
            found: Vec::new(),
            documents: Vec::new(),
        })
    }

    async fn search_sources(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let total = self.queries.len();
        for (index, query) in self.queries.iter().enumerate() {
            for site in &self.sources {
                match self.catalog.search_site(query, site).await {
                    Ok(docs) => self.found.extend(docs),
                    Err(e) => warn!(
                        target: "iosrag.discovery",
                        site = %site,
                        query = %query,
                        error = %e,
                        "Source search failed, skipping"
                    ),
                }
            }
            ctx.advance(
                (index + 1) as f64 / total as f64,
                format!("Searched '{query}' ({}/{total})", index + 1),
            )?;
            ctx.pace(0.5).await?;
        }
        ctx.set_detail(format!("Found {} candidate documents", self.found.len()));
        Ok(())
    }

    fn validate(&mut self, ctx: &mut StepContext) {
        let now = Utc::now();
        let mut seen = HashSet::new();
        self.found.retain(|doc| seen.insert(doc.location().to_string()));
        for doc in &mut self.found {
            doc.validated = true;
            doc.validation_date = Some(now);
        }
        ctx.set_detail(format!("{} unique documents validated", self.found.len()));
    }

    async fn organize(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let mut candidates = std::mem::take(&mut self.found);
        sort_by_relevance(&mut candidates);

        let mut claimed = self
            .repository
            .claim_discovered(candidates, self.request.max_documents)
            .await?;
        let now = Utc::now();
        for (index, doc) in claimed.iter_mut().enumerate() {
            doc.rank = Some(index + 1);
            doc.discovered_at = Some(now);
        }
        self.repository.store_discovered(&claimed).await?;

        ctx.set_detail(format!("Ranked {} new documents", claimed.len()));
        self.documents = claimed;
        Ok(())
    }
}

#[async_trait]
impl OperationTask for DiscoveryTask {
    fn kind(&self) -> OperationKind {
        OperationKind::Discovery
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
            "initialize" => {
                self.sources = if self.request.sources.is_empty() {
                    self.catalog.trusted_sources()
                } else {
                    self.request.sources.clone()
                };
                ctx.set_detail(format!("{} sources", self.sources.len()));
            }
            "generate_queries" => {
                self.queries = queries::discovery_queries(
                    &self.request.topic,
                    &self.request.certification_level,
                );
                ctx.set_field("queries", &self.queries)?;
                ctx.set_detail(format!("Generated {} queries", self.queries.len()));
            }
            "search_sources" => self.search_sources(ctx).await?,
            "validate" => self.validate(ctx),
            "download" => self.organize(ctx).await?,
            other => return Err(OperationError::Internal(format!("Unknown step {other}"))),
        }
        ctx.pace(1.0).await
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        ctx.set_message(format!(
            "Discovered {} documents for '{}'",
            self.documents.len(),
            self.request.topic
        ));
        ctx.set_field("count", self.documents.len())?;
        ctx.set_field("documents", &self.documents)
    }
}
