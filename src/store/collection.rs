//! Master and working views of one entity kind.

use crate::models::{Flashcard, JournalEntry};

/// An entity held in a [`Collection`].
pub trait Entity: Clone {
    fn id(&self) -> i64;

    /// Case-insensitive substring match. `needle` is already lowercased.
    fn matches(&self, needle: &str) -> bool;
}

impl Entity for JournalEntry {
    fn id(&self) -> i64 {
        self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.topic, needle)
            || contains(&self.content, needle)
            || self.tags.as_deref().is_some_and(|t| contains(t, needle))
    }
}

impl Entity for Flashcard {
    fn id(&self) -> i64 {
        self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.front, needle) || contains(&self.back, needle)
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Where new entities go in the master order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

/// The authoritative master sequence plus the currently displayed projection.
///
/// `working` is always a subsequence of `master` in master order.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    master: Vec<T>,
    working: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            master: Vec::new(),
            working: Vec::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn master(&self) -> &[T] {
        &self.master
    }

    pub fn working(&self) -> &[T] {
        &self.working
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.master.iter().find(|item| item.id() == id)
    }

    /// Index of `id` in master order.
    pub fn position(&self, id: i64) -> Option<usize> {
        self.master.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.master.len()
    }

    /// Replace everything, then project with `filter`.
    pub fn replace(&mut self, items: Vec<T>, filter: Option<&str>) {
        self.master = items;
        self.apply_filter(filter);
    }

    pub fn insert(&mut self, item: T, placement: Placement, filter: Option<&str>) {
        let visible = filter.map_or(true, |needle| item.matches(needle));
        match placement {
            Placement::Front => {
                if visible {
                    self.working.insert(0, item.clone());
                }
                self.master.insert(0, item);
            }
            Placement::Back => {
                if visible {
                    self.working.push(item.clone());
                }
                self.master.push(item);
            }
        }
    }

    /// Overwrite the entity with the same id in master and, if shown, in working.
    /// Returns false when the id is not in master.
    pub fn replace_item(&mut self, item: T) -> bool {
        let id = item.id();
        let Some(slot) = self.master.iter_mut().find(|m| m.id() == id) else {
            return false;
        };
        *slot = item.clone();
        if let Some(shown) = self.working.iter_mut().find(|w| w.id() == id) {
            *shown = item;
        }
        true
    }

    /// Remove by id from both views. Absent ids are a no-op.
    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.working.retain(|w| w.id() != id);
        let pos = self.position(id)?;
        Some(self.master.remove(pos))
    }

    /// Re-derive working from master. `None` shows everything.
    pub fn apply_filter(&mut self, filter: Option<&str>) {
        self.working = match filter {
            None => self.master.clone(),
            Some(needle) => self
                .master
                .iter()
                .filter(|item| item.matches(needle))
                .cloned()
                .collect(),
        };
    }
}
