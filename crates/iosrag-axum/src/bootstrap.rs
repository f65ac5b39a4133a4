//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the web adapter. All concrete implementations are instantiated here.

use std::sync::Arc;

use anyhow::{Context, Result};
use iosrag_catalog::{CannedLlmClient, CatalogConfig, StaticDocumentCatalog};
use iosrag_core::services::AppCore;
use iosrag_core::{ConfigStore, CoreDeps};
use iosrag_extract::FileTextExtractor;
use iosrag_runtime::SysinfoProbe;
use iosrag_store::{InMemoryDocumentRepository, JsonConfigStore};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::dispatch::RequestRouter;
use crate::emitter::Emitter;
use crate::registry::ConnectionRegistry;

/// Application context for the web adapter.
///
/// Holds every initialized service shared by the REST handlers and the
/// client channel sessions.
pub struct AxumContext {
    /// The core application facade.
    pub core: Arc<AppCore>,
    /// Connected clients.
    pub registry: Arc<ConnectionRegistry>,
    /// Outbound delivery to registered clients.
    pub emitter: Emitter,
    /// Inbound action routing.
    pub router: RequestRouter,
}

impl AxumContext {
    /// Wrap an already assembled core.
    pub fn new(core: Arc<AppCore>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let emitter = Emitter::new(Arc::clone(&registry));
        let router = RequestRouter::new(Arc::clone(&core), emitter.clone());
        Self {
            core,
            registry,
            emitter,
            router,
        }
    }
}

/// Bootstrap the server with all services.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let config_path = config.config_path();
    let download_dir = config.download_dir();

    info!(
        target: "iosrag.paths",
        data_dir = %config.data_dir.display(),
        config_file = %config_path.display(),
        download_dir = %download_dir.display(),
        pacing_ms = config.pacing_ms,
        "Bootstrap resolved paths"
    );

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;

    // 1. Configuration store; a corrupt file stops startup rather than being overwritten
    let config_store = Arc::new(JsonConfigStore::new(config_path));
    let system_config = config_store
        .load()
        .await
        .context("Failed to load system configuration")?;
    info!(
        target: "iosrag.config",
        operation_mode = ?system_config.operation_mode,
        llm_provider = %system_config.llm_config.provider,
        api_keys = system_config.api_key_list.len(),
        "System configuration loaded"
    );

    // 2. Catalog and LLM stand-ins
    let catalog = Arc::new(StaticDocumentCatalog::new(
        CatalogConfig::new().with_download_dir(download_dir),
    ));
    let llm = Arc::new(CannedLlmClient::default());

    // 3. Assemble AppCore
    let deps = CoreDeps {
        catalog,
        repository: Arc::new(InMemoryDocumentRepository::new()),
        extractor: Arc::new(FileTextExtractor::default()),
        config_store,
        llm,
        probe: Arc::new(SysinfoProbe::new(config.data_dir.clone())),
    };
    let core = Arc::new(AppCore::new(deps, config.pacing()));

    Ok(AxumContext::new(core))
}

/// Bind the listener and serve until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let app = crate::routes::create_router(ctx, &config.cors());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("iosrag server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("iosrag server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
