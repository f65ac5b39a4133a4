//! `AppCore` - the primary application facade.
//!
//! Constructed once at the adapter's composition root and shared by every
//! connection. It builds operation tasks and answers one-shot requests.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::{
    ConfigService, LlmTestReport, LlmTester, PipelineTracker, SearchHistory, StatusService,
    SystemStatus, UpdateCheckReport, check_updates, default_questions,
};
use crate::config::LlmProvider;
use crate::domain::{AdvancedSearchRequest, AdvancedSearchResult, advanced_search};
use crate::ports::{
    ConfigStore, CoreError, DocumentCatalog, DocumentContent, DocumentRepository, LlmClient,
    ProgressSink, SystemProbePort, TextExtractor,
};
use crate::runner::{OperationError, OperationRunner, Pacing};
use crate::tasks::{
    AiAgentRequest, AiAgentTask, DiscoveryRequest, DiscoveryTask, DownloadRequest, DownloadTask,
    LocalFilesRequest, LocalFilesTask, SearchRequest, SearchTask, Stage1Request, Stage1Task,
    Stage2Request, Stage2Task,
};

/// Maximum number of query suggestions returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// The adapters `AppCore` is wired with.
pub struct CoreDeps {
    pub catalog: Arc<dyn DocumentCatalog>,
    pub repository: Arc<dyn DocumentRepository>,
    pub extractor: Arc<dyn TextExtractor>,
    pub config_store: Arc<dyn ConfigStore>,
    pub llm: Arc<dyn LlmClient>,
    pub probe: Arc<dyn SystemProbePort>,
}

/// The core application facade.
///
/// ```ignore
/// let core = AppCore::new(deps, Pacing::from_millis(500));
/// let runner = core.runner(sink, cancel);
/// runner.run(core.discovery(request)?).await;
/// ```
pub struct AppCore {
    catalog: Arc<dyn DocumentCatalog>,
    repository: Arc<dyn DocumentRepository>,
    extractor: Arc<dyn TextExtractor>,
    config: ConfigService,
    status: StatusService,
    llm: LlmTester,
    history: Arc<SearchHistory>,
    pipeline: Arc<PipelineTracker>,
    pacing: Pacing,
}

impl AppCore {
    pub fn new(deps: CoreDeps, pacing: Pacing) -> Self {
        Self {
            config: ConfigService::new(deps.config_store),
            status: StatusService::new(deps.probe, Arc::clone(&deps.repository)),
            llm: LlmTester::new(deps.llm),
            catalog: deps.catalog,
            repository: deps.repository,
            extractor: deps.extractor,
            history: Arc::new(SearchHistory::new()),
            pipeline: Arc::new(PipelineTracker::new()),
            pacing,
        }
    }

    pub const fn config(&self) -> &ConfigService {
        &self.config
    }

    pub const fn status(&self) -> &StatusService {
        &self.status
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn pipeline(&self) -> &PipelineTracker {
        &self.pipeline
    }

    pub fn repository(&self) -> &dyn DocumentRepository {
        self.repository.as_ref()
    }

    pub const fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// A runner that streams to `sink` and stops when `cancel` fires.
    pub fn runner(&self, sink: Arc<dyn ProgressSink>, cancel: CancellationToken) -> OperationRunner {
        OperationRunner::new(sink, self.pacing, cancel)
    }

    pub fn discovery(&self, request: DiscoveryRequest) -> Result<DiscoveryTask, OperationError> {
        DiscoveryTask::new(
            request,
            Arc::clone(&self.catalog),
            Arc::clone(&self.repository),
        )
    }

    pub fn local_files(&self, request: LocalFilesRequest) -> Result<LocalFilesTask, OperationError> {
        LocalFilesTask::new(
            request,
            Arc::clone(&self.extractor),
            Arc::clone(&self.repository),
        )
    }

    pub fn search(&self, request: SearchRequest) -> SearchTask {
        SearchTask::new(request, Arc::clone(&self.catalog), Arc::clone(&self.history))
    }

    pub fn ai_agent(&self, request: AiAgentRequest) -> Result<AiAgentTask, OperationError> {
        AiAgentTask::new(
            request,
            Arc::clone(&self.catalog),
            Arc::clone(&self.repository),
        )
    }

    pub fn stage1(&self, request: Stage1Request) -> Stage1Task {
        Stage1Task::new(request, Arc::clone(&self.pipeline))
    }

    pub fn stage2(&self, request: Stage2Request) -> Result<Stage2Task, OperationError> {
        Stage2Task::new(request, Arc::clone(&self.pipeline))
    }

    pub fn download(&self, request: DownloadRequest) -> DownloadTask {
        DownloadTask::new(
            request,
            Arc::clone(&self.catalog),
            Arc::clone(&self.repository),
        )
    }

    /// Aggregate status, including the number of open connections.
    pub async fn system_status(&self, connections: usize) -> Result<SystemStatus, CoreError> {
        let config = self.config.current().await?;
        self.status
            .status(&config, self.pipeline.snapshot(), connections)
            .await
    }

    /// Ask the LLM the given questions, or the default set when empty.
    ///
    /// Without an explicit provider the configured one is used.
    pub async fn test_llm(
        &self,
        provider: Option<LlmProvider>,
        questions: Vec<String>,
    ) -> Result<LlmTestReport, CoreError> {
        let provider = match provider {
            Some(provider) => provider,
            None => self.config.current().await?.llm_config.provider,
        };
        let questions = if questions.is_empty() {
            default_questions()
        } else {
            questions
        };
        Ok(self.llm.run(provider, &questions).await)
    }

    /// Discovered documents older than `max_age_days`, or the configured
    /// retention window when not given.
    pub async fn check_document_updates(
        &self,
        max_age_days: Option<u32>,
    ) -> Result<UpdateCheckReport, CoreError> {
        let max_age_days = match max_age_days {
            Some(days) => days,
            None => self.config.current().await?.retention_days(),
        };
        let documents = self.repository.discovered().await?;
        Ok(check_updates(&documents, max_age_days, Utc::now()))
    }

    pub async fn advanced_search(
        &self,
        request: &AdvancedSearchRequest,
    ) -> Result<AdvancedSearchResult, CoreError> {
        let library = self.catalog.library().await?;
        Ok(advanced_search(library, request, Utc::now().date_naive())?)
    }

    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        self.catalog.suggestions(partial, MAX_SUGGESTIONS)
    }

    pub async fn document_content(&self, id: &str) -> Result<DocumentContent, CoreError> {
        Ok(self.catalog.document_content(id).await?)
    }
}
