//! Journal API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult, DeleteResponse};
use crate::models::{CreateEntryRequest, JournalEntry, UpdateEntryRequest};
use crate::AppState;

/// GET /api/logs - Journal entries visible under the active search.
pub async fn list_entries(State(state): State<AppState>) -> ApiResult<Vec<JournalEntry>> {
    success(state.sync.list_entries().await)
}

/// GET /api/logs/:id - Get a single entry.
pub async fn get_entry(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<JournalEntry> {
    success(state.sync.get_entry(id).await?)
}

/// POST /api/logs - Create a new entry.
pub async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> ApiResult<JournalEntry> {
    success(state.sync.create_entry(&request).await?)
}

/// PUT /api/logs/:id - Update an entry and close its edit session.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEntryRequest>,
) -> ApiResult<JournalEntry> {
    success(state.sync.update_entry(id, &request).await?)
}

/// DELETE /api/logs/:id - Delete an entry. Unknown ids report `deleted: false`.
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<DeleteResponse> {
    let deleted = state.sync.delete_entry(id).await;
    success(DeleteResponse { deleted })
}

// ==================== EDIT SESSION ====================

/// Current edit target.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditState {
    pub editing_id: Option<i64>,
}

/// POST /api/logs/:id/edit - Start editing an entry.
pub async fn begin_edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<JournalEntry> {
    success(state.sync.begin_edit(id).await?)
}

/// GET /api/edit - Which entry, if any, is being edited.
pub async fn get_edit(State(state): State<AppState>) -> ApiResult<EditState> {
    success(EditState {
        editing_id: state.sync.editing().await,
    })
}

/// DELETE /api/edit - Abandon the current edit. Returns the id that was being edited.
pub async fn cancel_edit(State(state): State<AppState>) -> ApiResult<EditState> {
    success(EditState {
        editing_id: state.sync.cancel_edit().await,
    })
}
