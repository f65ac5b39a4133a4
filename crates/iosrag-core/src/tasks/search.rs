//! Streaming search over the indexed document library.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{
    LibraryDocument, OperationKind, SearchFilters, apply_query_relevance, matches_query,
    sort_library_by_relevance,
};
use crate::ports::DocumentCatalog;
use crate::runner::{OperationError, OperationTask, StepContext, StepDef};
use crate::services::SearchHistory;

const STEPS: [StepDef; 3] = [
    StepDef::fixed("filter", "Filtering documents", 0.0, 40.0),
    StepDef::fixed("score", "Scoring relevance", 40.0, 80.0),
    StepDef::fixed("rank", "Ranking results", 80.0, 100.0),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(flatten)]
    pub filters: SearchFilters,
    /// Also store this search under the given name.
    #[serde(default)]
    pub save_as: Option<String>,
}

pub struct SearchTask {
    request: SearchRequest,
    catalog: Arc<dyn DocumentCatalog>,
    history: Arc<SearchHistory>,
    results: Vec<LibraryDocument>,
}

impl SearchTask {
    pub fn new(
        request: SearchRequest,
        catalog: Arc<dyn DocumentCatalog>,
        history: Arc<SearchHistory>,
    ) -> Self {
        Self {
            request,
            catalog,
            history,
            results: Vec::new(),
        }
    }
}

#[async_trait]
impl OperationTask for SearchTask {
    fn kind(&self) -> OperationKind {
        OperationKind::Search
    }

    fn steps(&self) -> Vec<StepDef> {
        STEPS.to_vec()
    }

    fn prepare(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        ctx.set_field("query", &self.request.query)
    }

    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError> {
        match step.id.as_ref() {
            "filter" => {
                let library = self.catalog.library().await?;
                let total = library.len();
                let filters = &self.request.filters;
                let query = &self.request.query;
                self.results = library
                    .into_iter()
                    .filter(|doc| filters.matches(doc) && matches_query(doc, query))
                    .collect();
                ctx.set_detail(format!("{} of {total} documents match", self.results.len()));
            }
            "score" => {
                apply_query_relevance(&mut self.results, &self.request.query);
                ctx.set_detail(format!("Scored {} documents", self.results.len()));
            }
            "rank" => {
                sort_library_by_relevance(&mut self.results);
                ctx.set_results(&self.results)?;
                ctx.set_detail(format!("Ranked {} results", self.results.len()));
            }
            other => return Err(OperationError::Internal(format!("Unknown step {other}"))),
        }
        ctx.pace(0.6).await
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let SearchRequest {
            query,
            filters,
            save_as,
        } = &self.request;
        self.history.record(query, filters, self.results.len());
        if let Some(name) = save_as.as_deref().filter(|n| !n.trim().is_empty()) {
            self.history.save(name, query, filters);
        }
        ctx.set_field("count", self.results.len())?;
        ctx.set_message(format!("Found {} results", self.results.len()));
        Ok(())
    }
}
