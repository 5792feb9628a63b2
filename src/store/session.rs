//! Small pieces of UI-facing state: edit session, deck cursor, id clock.

use crate::errors::AppError;

/// At most one journal entry may be under edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    target: Option<i64>,
}

impl EditSession {
    pub fn current(&self) -> Option<i64> {
        self.target
    }

    /// Fails with `EditInProgress` while another target is active.
    pub fn begin(&mut self, id: i64) -> Result<(), AppError> {
        if let Some(active_id) = self.target {
            return Err(AppError::EditInProgress { active_id });
        }
        self.target = Some(id);
        Ok(())
    }

    pub fn clear(&mut self) -> Option<i64> {
        self.target.take()
    }

    /// Clear only if `id` is the active target.
    pub fn finish(&mut self, id: i64) -> bool {
        if self.target == Some(id) {
            self.target = None;
            return true;
        }
        false
    }
}

/// Position of the card shown in study mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckCursor {
    index: usize,
}

impl DeckCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.index = (self.index + 1) % len;
        }
    }

    pub fn prev(&mut self, len: usize) {
        if len > 0 {
            self.index = (self.index + len - 1) % len;
        }
    }

    /// Keep the cursor on a valid card after removals.
    pub fn clamp(&mut self, len: usize) {
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }

    /// Follow the card under the cursor when the card at `position` is
    /// removed, leaving `len` cards.
    pub fn removed_at(&mut self, position: usize, len: usize) {
        if position < self.index {
            self.index -= 1;
        }
        self.clamp(len);
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Millisecond ids that never repeat and never go backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdClock {
    last: i64,
}

impl IdClock {
    pub fn observe<I: IntoIterator<Item = i64>>(&mut self, ids: I) {
        if let Some(max) = ids.into_iter().max() {
            self.last = self.last.max(max);
        }
    }

    pub fn next(&mut self, now_ms: i64) -> i64 {
        self.last = now_ms.max(self.last + 1);
        self.last
    }
}
