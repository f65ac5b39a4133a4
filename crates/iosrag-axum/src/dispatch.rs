//! Request router: maps inbound `{action, data}` envelopes to handlers.
//!
//! Task actions run through the operation runner and stream their own
//! progress. One-shot actions reply with a single message. Every failure is
//! reported to the requesting client as an `error` message; nothing here
//! propagates past the envelope that caused it.

use std::fmt;
use std::sync::Arc;

use iosrag_core::services::DEFAULT_HISTORY_LIMIT;
use iosrag_core::{
    AdvancedSearchRequest, AppCore, CoreError, LlmProvider, NewApiKey, OperationError,
    OperationTask, ProgressSink, ServerEvent, SystemConfigUpdate,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::emitter::{ClientSink, Emitter};

/// Error text sent for frames that are not a valid envelope.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON message";

/// One inbound channel message.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

/// Every action the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DocumentDiscovery,
    ProcessLocalFiles,
    DocumentSearch,
    AiAgent,
    DownloadDocument,
    PipelineStage1,
    PipelineStage2,
    SystemConfig,
    GetStatus,
    TestLlmConnection,
    CheckDocumentUpdates,
    GetSearchHistory,
    GetSavedSearches,
    AdvancedSearch,
    GetSearchSuggestions,
    GetDocumentContent,
    GetPipelineStatus,
    ResetPipeline,
}

impl Action {
    pub fn parse(action: &str) -> Option<Self> {
        Some(match action {
            "document_discovery" => Self::DocumentDiscovery,
            "process_local_files" => Self::ProcessLocalFiles,
            "document_search" => Self::DocumentSearch,
            "ai_agent" => Self::AiAgent,
            "download_document" => Self::DownloadDocument,
            "pipeline_stage1" => Self::PipelineStage1,
            "pipeline_stage2" => Self::PipelineStage2,
            "system_config" => Self::SystemConfig,
            "get_status" => Self::GetStatus,
            "test_llm_connection" => Self::TestLlmConnection,
            "check_document_updates" => Self::CheckDocumentUpdates,
            "get_search_history" => Self::GetSearchHistory,
            "get_saved_searches" => Self::GetSavedSearches,
            "advanced_search" => Self::AdvancedSearch,
            "get_search_suggestions" => Self::GetSearchSuggestions,
            "get_document_content" => Self::GetDocumentContent,
            "get_pipeline_status" => Self::GetPipelineStatus,
            "reset_pipeline" => Self::ResetPipeline,
            _ => return None,
        })
    }

    /// Prefix for error messages caused by this action.
    const fn error_prefix(self) -> &'static str {
        match self {
            Self::DocumentDiscovery => "Discovery error",
            Self::ProcessLocalFiles => "Local file processing error",
            Self::DocumentSearch => "Search error",
            Self::AiAgent => "AI Agent error",
            Self::DownloadDocument => "Download error",
            Self::PipelineStage1 => "Pipeline Stage 1 error",
            Self::PipelineStage2 => "Pipeline Stage 2 error",
            Self::SystemConfig => "Config error",
            Self::GetStatus => "Status error",
            Self::TestLlmConnection => "LLM test error",
            Self::CheckDocumentUpdates => "Document update check error",
            Self::GetSearchHistory => "Search history error",
            Self::GetSavedSearches => "Saved searches error",
            Self::AdvancedSearch => "Advanced search error",
            Self::GetSearchSuggestions => "Search suggestions error",
            Self::GetDocumentContent => "Document content error",
            Self::GetPipelineStatus | Self::ResetPipeline => "Pipeline status error",
        }
    }
}

/// Why an action could not be answered.
#[derive(Debug)]
enum ActionError {
    /// The `data` object did not match the action's request shape.
    Data(serde_json::Error),
    Missing(&'static str),
    Operation(OperationError),
    Core(CoreError),
}

impl ActionError {
    const fn is_input_error(&self) -> bool {
        match self {
            Self::Data(_) | Self::Missing(_) => true,
            Self::Operation(err) => matches!(err, OperationError::Input(_)),
            Self::Core(err) => err.is_input_error(),
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "Invalid request data: {e}"),
            Self::Missing(field) => write!(f, "Missing {field}"),
            Self::Operation(e) => e.fmt(f),
            Self::Core(e) => e.fmt(f),
        }
    }
}

impl From<OperationError> for ActionError {
    fn from(err: OperationError) -> Self {
        Self::Operation(err)
    }
}

impl From<CoreError> for ActionError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

/// Decode `data` into a request, treating a missing object as `{}`.
fn parse<T: DeserializeOwned>(data: Value) -> Result<T, ActionError> {
    let data = if data.is_null() {
        Value::Object(Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(ActionError::Data)
}

#[derive(Debug, Deserialize)]
struct ConfigRequest {
    #[serde(default)]
    request: Option<String>,
    #[serde(default)]
    key_data: NewApiKey,
    #[serde(default)]
    key_id: Option<String>,
    #[serde(flatten)]
    update: SystemConfigUpdate,
}

#[derive(Debug, Default, Deserialize)]
struct LlmTestRequest {
    #[serde(default)]
    provider: Option<LlmProvider>,
    #[serde(default)]
    questions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdatesRequest {
    #[serde(default)]
    max_age_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryRequest {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestionsRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Default, Deserialize)]
struct ContentRequest {
    #[serde(default)]
    document_id: Option<String>,
}

/// Per-connection context the router replies through.
#[derive(Clone)]
pub struct Session {
    client_id: String,
    sink: Arc<ClientSink>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(emitter: &Emitter, client_id: impl Into<String>, cancel: CancellationToken) -> Self {
        let client_id = client_id.into();
        Self {
            sink: Arc::new(emitter.sink(client_id.clone()).bound_to(cancel.clone())),
            client_id,
            cancel,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Routes envelopes to the core facade.
#[derive(Clone)]
pub struct RequestRouter {
    core: Arc<AppCore>,
    emitter: Emitter,
}

impl RequestRouter {
    pub const fn new(core: Arc<AppCore>, emitter: Emitter) -> Self {
        Self { core, emitter }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Decode a text frame and handle it to completion.
    pub async fn handle_text(&self, session: &Session, text: &str) {
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => self.dispatch(session, envelope).await,
            Err(e) => {
                debug!(target: "iosrag.ws", client_id = %session.client_id(), error = %e, "Invalid JSON frame");
                self.reply(session, ServerEvent::error(INVALID_JSON_MESSAGE));
            }
        }
    }

    /// Handle one envelope to completion.
    pub async fn dispatch(&self, session: &Session, envelope: Envelope) {
        let client_id = session.client_id();
        let Some(action) = Action::parse(&envelope.action) else {
            debug!(target: "iosrag.ws", client_id = %client_id, action = %envelope.action, "Unknown action");
            self.reply(session, ServerEvent::error(format!("Unknown action: {}", envelope.action)));
            return;
        };
        debug!(target: "iosrag.ws", client_id = %client_id, action = %envelope.action, "Dispatching");

        if let Err(err) = self.handle(action, session, envelope.data).await {
            if err.is_input_error() {
                debug!(target: "iosrag.ws", client_id = %client_id, ?action, error = %err, "Rejected request");
            } else {
                warn!(target: "iosrag.ws", client_id = %client_id, ?action, error = %err, "Request failed");
            }
            self.reply(session, ServerEvent::error(format!("{}: {err}", action.error_prefix())));
        }
    }

    async fn handle(&self, action: Action, session: &Session, data: Value) -> Result<(), ActionError> {
        let core = &self.core;
        match action {
            Action::DocumentDiscovery => {
                let task = core.discovery(parse(data)?)?;
                self.launch(session, task, "Starting document discovery...").await;
            }
            Action::ProcessLocalFiles => {
                let task = core.local_files(parse(data)?)?;
                self.launch(session, task, "Starting local file processing...").await;
            }
            Action::DocumentSearch => {
                let task = core.search(parse(data)?);
                self.launch(session, task, "Starting document search...").await;
            }
            Action::AiAgent => {
                let task = core.ai_agent(parse(data)?)?;
                self.launch(session, task, "AI agent starting...").await;
            }
            Action::DownloadDocument => {
                let task = core.download(parse(data)?);
                self.launch(session, task, "Starting download...").await;
            }
            Action::PipelineStage1 => {
                let task = core.stage1(parse(data)?);
                self.launch(session, task, "Starting Stage 1: Document Discovery").await;
            }
            Action::PipelineStage2 => {
                let task = core.stage2(parse(data)?)?;
                self.launch(session, task, "Starting Stage 2: Synthetic Data Factory")
                    .await;
            }
            Action::SystemConfig => self.system_config(session, parse(data)?).await?,
            Action::GetStatus => {
                let status = core.system_status(self.emitter.registry().count()).await?;
                self.reply(session, ServerEvent::SystemStatus {
                    status: Box::new(status),
                });
            }
            Action::TestLlmConnection => {
                let request: LlmTestRequest = parse(data)?;
                let report = core.test_llm(request.provider, request.questions).await?;
                self.reply(session, ServerEvent::LlmTestResults(report));
            }
            Action::CheckDocumentUpdates => {
                let request: UpdatesRequest = parse(data)?;
                let result = core.check_document_updates(request.max_age_days).await?;
                self.reply(session, ServerEvent::DocumentUpdatesChecked { result });
            }
            Action::GetSearchHistory => {
                let request: HistoryRequest = parse(data)?;
                let result = core
                    .history()
                    .recent(request.limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
                self.reply(session, ServerEvent::SearchHistory { result });
            }
            Action::GetSavedSearches => {
                let result = core.history().saved();
                self.reply(session, ServerEvent::SavedSearches { result });
            }
            Action::AdvancedSearch => {
                let request: AdvancedSearchRequest = parse(data)?;
                let result = core.advanced_search(&request).await?;
                self.reply(session, ServerEvent::AdvancedSearchResults { result });
            }
            Action::GetSearchSuggestions => {
                let request: SuggestionsRequest = parse(data)?;
                let suggestions = core.suggestions(&request.query);
                self.reply(session, ServerEvent::SearchSuggestions {
                    query: request.query,
                    suggestions,
                });
            }
            Action::GetDocumentContent => {
                let request: ContentRequest = parse(data)?;
                let id = request
                    .document_id
                    .filter(|id| !id.is_empty())
                    .ok_or(ActionError::Missing("document_id"))?;
                let content = core.document_content(&id).await?;
                self.reply(session, ServerEvent::DocumentContent {
                    result: Box::new(content),
                });
            }
            Action::GetPipelineStatus => {
                let result = core.pipeline().snapshot();
                self.reply(session, ServerEvent::PipelineStatus { result });
            }
            Action::ResetPipeline => {
                let result = core.pipeline().reset();
                self.reply(session, ServerEvent::PipelineStatus { result });
            }
        }
        Ok(())
    }

    /// Answer on the session's own stream; a replaced session stays silent.
    fn reply(&self, session: &Session, event: ServerEvent) {
        session.sink.emit(event);
    }

    /// Announce and run a task on the session's stream.
    async fn launch<T: OperationTask>(&self, session: &Session, task: T, start_message: &str) {
        if let Some(notice) = ServerEvent::starting(task.kind(), start_message) {
            self.reply(session, notice);
        }
        let sink = Arc::clone(&session.sink);
        self.core
            .runner(sink, session.cancel.clone())
            .run(task)
            .await;
    }

    async fn system_config(&self, session: &Session, request: ConfigRequest) -> Result<(), ActionError> {
        let config = self.core.config();
        let key_id = || request.key_id.as_deref().ok_or(ActionError::Missing("key_id"));

        let (reply, mutated) = match request.request.as_deref() {
            Some("get_config") => (config.get().await?, false),
            Some("get_api_keys") => (config.api_keys().await?, false),
            Some("save_api_key") => (config.save_api_key(request.key_data.clone()).await?, true),
            Some("delete_api_key") => (config.delete_api_key(key_id()?).await?, true),
            Some("set_active_api_key") => (config.set_active_api_key(key_id()?).await?, true),
            None | Some("update_config") => (config.update(&request.update).await?, true),
            Some(other) => {
                debug!(
                    target: "iosrag.ws",
                    client_id = %session.client_id(),
                    request = %other,
                    "Unrecognized config request, applying as a settings update"
                );
                (config.update(&request.update).await?, true)
            }
        };

        let changed = mutated.then(|| ServerEvent::ConfigChanged {
            config: Box::new(reply.config.clone()),
        });
        self.reply(session, ServerEvent::ConfigUpdated {
            result: Box::new(reply),
        });
        if let Some(changed) = changed {
            self.emitter.broadcast(&changed);
        }
        Ok(())
    }
}
