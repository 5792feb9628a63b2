//! Read-side endpoints: full state, search, streak and manual sync.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{SearchView, StateSnapshot};
use crate::streak::StreakInfo;
use crate::sync::HydrationReport;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search text; missing or blank clears the filter.
    #[serde(default)]
    pub q: String,
}

/// GET /api/state - Everything needed to render the app.
pub async fn get_state(State(state): State<AppState>) -> ApiResult<StateSnapshot> {
    success(state.sync.snapshot().await)
}

/// GET /api/search - Set the active search and return the filtered views.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchView> {
    success(state.sync.search(&params.q).await)
}

/// GET /api/streak - Consecutive study days ending today or yesterday.
pub async fn get_streak(State(state): State<AppState>) -> ApiResult<StreakInfo> {
    success(state.sync.streak().await)
}

/// POST /api/sync - Reload both collections from the remote mirror.
pub async fn sync_remote(State(state): State<AppState>) -> ApiResult<HydrationReport> {
    success(state.sync.hydrate_from_remote().await)
}
