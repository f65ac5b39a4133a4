//! Document handlers - discovered documents and ingested local files.

use axum::Json;
use axum::extract::State;

use crate::error::HttpError;
use crate::state::AppState;
use iosrag_core::{DocumentRecord, LocalFileRecord};

/// List discovered documents, oldest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DocumentRecord>>, HttpError> {
    Ok(Json(state.core.repository().discovered().await?))
}

/// List processed local files, oldest first.
pub async fn local_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocalFileRecord>>, HttpError> {
    Ok(Json(state.core.repository().local_files().await?))
}
