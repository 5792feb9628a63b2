//! Flashcard and study deck endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult, DeleteResponse};
use crate::models::{CreateCardRequest, DeckView, Flashcard, UpdateCardRequest};
use crate::AppState;

/// GET /api/cards - Cards visible under the active search.
pub async fn list_cards(State(state): State<AppState>) -> ApiResult<Vec<Flashcard>> {
    success(state.sync.list_cards().await)
}

/// GET /api/cards/:id - Get a single card.
pub async fn get_card(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Flashcard> {
    success(state.sync.get_card(id).await?)
}

/// POST /api/cards - Create a new card at the end of the deck.
pub async fn create_card(
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> ApiResult<Flashcard> {
    success(state.sync.create_card(&request).await?)
}

/// PUT /api/cards/:id - Update a card in place.
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCardRequest>,
) -> ApiResult<Flashcard> {
    success(state.sync.update_card(id, &request).await?)
}

/// DELETE /api/cards/:id - Delete a card.
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<DeleteResponse> {
    let deleted = state.sync.delete_card(id).await;
    success(DeleteResponse { deleted })
}

// ==================== DECK ====================

/// GET /api/deck - Card under the study cursor.
pub async fn get_deck(State(state): State<AppState>) -> ApiResult<DeckView> {
    success(state.sync.deck().await)
}

/// POST /api/deck/next
pub async fn next_card(State(state): State<AppState>) -> ApiResult<DeckView> {
    success(state.sync.next_card().await)
}

/// POST /api/deck/prev
pub async fn prev_card(State(state): State<AppState>) -> ApiResult<DeckView> {
    success(state.sync.prev_card().await)
}
