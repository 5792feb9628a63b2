//! Backup export and import.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{ImportSummary, BACKUP_FILE_NAME};
use crate::AppState;

/// GET /api/backup - Download both collections as a JSON file.
///
/// The body is the raw backup document, not the response envelope, so the
/// file can be fed straight back into `POST /api/backup`.
pub async fn export_backup(State(state): State<AppState>) -> Result<Response, AppError> {
    let document = state.sync.export().await;
    let body = serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::Internal(format!("Failed to encode backup: {}", e)))?;

    tracing::info!(
        "Exported backup with {} entries and {} cards",
        document.logs.len(),
        document.cards.len()
    );

    let disposition = format!("attachment; filename=\"{}\"", BACKUP_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/backup - Restore from a backup file. The body is read as text
/// so malformed files get a structured error instead of an extractor rejection.
pub async fn import_backup(State(state): State<AppState>, body: String) -> ApiResult<ImportSummary> {
    success(state.sync.import_raw(&body).await?)
}
