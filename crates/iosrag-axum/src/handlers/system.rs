//! Service info, liveness and aggregate status handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;
use iosrag_core::services::{SystemStatus, service_map};

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, String>,
    pub connections: usize,
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Cisco IOS RAG System Backend",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// Liveness: always healthy while the process answers.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        timestamp: Utc::now(),
        services: service_map(),
        connections: state.registry.count(),
    })
}

/// Same payload as the `system_status` channel reply.
pub async fn status(State(state): State<AppState>) -> Result<Json<SystemStatus>, HttpError> {
    Ok(Json(state.core.system_status(state.registry.count()).await?))
}
