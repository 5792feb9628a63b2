//! Rendering-ready views handed back to the UI.

use serde::Serialize;

use super::{Flashcard, JournalEntry};
use crate::streak::StreakInfo;

/// Everything the UI needs to redraw after an operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub logs: Vec<JournalEntry>,
    pub cards: Vec<Flashcard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing_id: Option<i64>,
    pub streak: StreakInfo,
    /// Whether a remote mirror is configured
    pub online: bool,
}

/// Working views after a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub logs: Vec<JournalEntry>,
    pub cards: Vec<Flashcard>,
}

/// Card currently shown in study mode.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeckView {
    pub index: usize,
    pub total: usize,
    pub card: Option<Flashcard>,
}
