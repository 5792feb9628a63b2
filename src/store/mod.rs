//! Working set: master and working collections for both entity kinds.
//!
//! The store is plain data. The orchestrator owns it behind a lock and is the
//! only place that persists or mirrors what changes here.

mod collection;
mod session;

pub use collection::*;
pub use session::*;

use crate::errors::AppError;
use crate::models::{DeckView, Flashcard, JournalEntry};

/// In-memory state of the app.
#[derive(Debug, Clone, Default)]
pub struct Store {
    logs: Collection<JournalEntry>,
    cards: Collection<Flashcard>,
    /// Lowercased active search term
    query: Option<String>,
    edit: EditSession,
    deck: DeckCursor,
    ids: IdClock,
}

impl Store {
    pub fn new(logs: Vec<JournalEntry>, cards: Vec<Flashcard>) -> Self {
        let mut store = Self::default();
        store.replace_logs(logs);
        store.replace_cards(cards);
        store
    }

    pub fn logs(&self) -> &Collection<JournalEntry> {
        &self.logs
    }

    pub fn cards(&self) -> &Collection<Flashcard> {
        &self.cards
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn editing(&self) -> Option<i64> {
        self.edit.current()
    }

    pub fn next_id(&mut self, now_ms: i64) -> i64 {
        self.ids.next(now_ms)
    }

    // ==================== JOURNAL ====================

    /// Replace the journal, keeping it newest-first.
    pub fn replace_logs(&mut self, mut logs: Vec<JournalEntry>) {
        logs.sort_by(|a, b| b.id.cmp(&a.id));
        self.ids.observe(logs.iter().map(|l| l.id));
        self.logs.replace(logs, self.query.as_deref());
        if let Some(id) = self.edit.current() {
            if !self.logs.contains(id) {
                self.edit.clear();
            }
        }
    }

    pub fn add_log(&mut self, entry: JournalEntry) {
        self.ids.observe([entry.id]);
        self.logs
            .insert(entry, Placement::Front, self.query.as_deref());
    }

    /// Store an edited entry and end its edit session.
    pub fn put_log(&mut self, entry: JournalEntry) -> Result<(), AppError> {
        let id = entry.id;
        if !self.logs.replace_item(entry) {
            return Err(not_found("Entry", id));
        }
        self.edit.finish(id);
        Ok(())
    }

    pub fn remove_log(&mut self, id: i64) -> Option<JournalEntry> {
        let removed = self.logs.remove(id);
        if removed.is_some() {
            self.edit.finish(id);
        }
        removed
    }

    pub fn begin_edit(&mut self, id: i64) -> Result<&JournalEntry, AppError> {
        if !self.logs.contains(id) {
            return Err(not_found("Entry", id));
        }
        self.edit.begin(id)?;
        self.logs.get(id).ok_or_else(|| not_found("Entry", id))
    }

    pub fn cancel_edit(&mut self) -> Option<i64> {
        self.edit.clear()
    }

    // ==================== CARDS ====================

    pub fn replace_cards(&mut self, cards: Vec<Flashcard>) {
        self.ids.observe(cards.iter().map(|c| c.id));
        self.cards.replace(cards, self.query.as_deref());
        self.deck.reset();
    }

    pub fn add_card(&mut self, card: Flashcard) {
        self.ids.observe([card.id]);
        self.cards.insert(card, Placement::Back, self.query.as_deref());
    }

    pub fn put_card(&mut self, card: Flashcard) -> Result<(), AppError> {
        let id = card.id;
        if !self.cards.replace_item(card) {
            return Err(not_found("Card", id));
        }
        Ok(())
    }

    pub fn remove_card(&mut self, id: i64) -> Option<Flashcard> {
        let position = self.cards.position(id)?;
        let removed = self.cards.remove(id);
        self.deck.removed_at(position, self.cards.count());
        removed
    }

    pub fn deck(&self) -> DeckView {
        let total = self.cards.count();
        DeckView {
            index: self.deck.index(),
            total,
            card: self.cards.master().get(self.deck.index()).cloned(),
        }
    }

    pub fn next_card(&mut self) -> DeckView {
        self.deck.next(self.cards.count());
        self.deck()
    }

    pub fn prev_card(&mut self) -> DeckView {
        self.deck.prev(self.cards.count());
        self.deck()
    }

    // ==================== SEARCH ====================

    /// Project both working views through `text`. Blank text shows everything.
    pub fn search(&mut self, text: &str) {
        let needle = text.trim().to_lowercase();
        self.query = if needle.is_empty() { None } else { Some(needle) };
        self.logs.apply_filter(self.query.as_deref());
        self.cards.apply_filter(self.query.as_deref());
    }
}

fn not_found(kind: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}
