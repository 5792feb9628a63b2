//! Sync orchestrator.
//!
//! Every mutation runs in the same order: validate, update the in-memory
//! store, write the durable cache, then hand the remote write to the
//! dispatcher without waiting for it. The local result is final; nothing
//! the mirror does later can reverse it.

mod dispatch;

pub use dispatch::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::LocalCache;
use crate::errors::AppError;
use crate::models::{
    BackupDocument, CreateCardRequest, CreateEntryRequest, DeckView, Flashcard, ImportDocument,
    ImportSummary, JournalEntry, SearchView, StateSnapshot, UpdateCardRequest, UpdateEntryRequest,
};
use crate::remote::RemoteTable;
use crate::store::Store;
use crate::streak::{streak_days, StreakInfo};

/// Result of reconciling one collection with the mirror.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum CollectionSync {
    Replaced { count: usize },
    Failed { message: String },
}

/// Result of a remote hydration attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum HydrationReport {
    /// No mirror configured
    Offline,
    /// Another hydration is running
    InProgress,
    Completed {
        logs: CollectionSync,
        cards: CollectionSync,
    },
}

/// Clears the in-flight flag when hydration ends, however it ends.
struct HydrationGuard<'a>(&'a AtomicBool);

impl Drop for HydrationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the store and coordinates it with the cache and the mirror.
pub struct SyncOrchestrator {
    store: RwLock<Store>,
    cache: LocalCache,
    remote: RemoteDispatcher,
    hydrating: AtomicBool,
}

impl SyncOrchestrator {
    /// Load from the cache and publish it. Never fails: unreadable slots load empty.
    pub async fn load(cache: LocalCache, remote: RemoteDispatcher) -> Self {
        let logs = cache.load_logs().await;
        let cards = cache.load_cards().await;
        tracing::info!(
            "Loaded {} journal entries and {} cards from cache",
            logs.len(),
            cards.len()
        );

        Self {
            store: RwLock::new(Store::new(logs, cards)),
            cache,
            remote,
            hydrating: AtomicBool::new(false),
        }
    }

    /// Startup sequence: cache load, initial streak, then a background hydration.
    pub async fn initialize(cache: LocalCache, remote: RemoteDispatcher) -> Arc<Self> {
        let orchestrator = Arc::new(Self::load(cache, remote).await);

        let streak = orchestrator.streak().await;
        tracing::info!("Current study streak: {}", streak.label);

        if orchestrator.remote.is_online() {
            let this = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                let report = this.hydrate_from_remote().await;
                tracing::debug!("Startup hydration finished: {:?}", report);
            });
        }

        orchestrator
    }

    pub fn is_online(&self) -> bool {
        self.remote.is_online()
    }

    /// Overwrite local collections with the mirror's copy.
    ///
    /// Each collection is handled on its own; a failed fetch leaves that
    /// collection untouched. Unsynced local edits are overwritten.
    pub async fn hydrate_from_remote(&self) -> HydrationReport {
        let Some(mirror) = self.remote.mirror().cloned() else {
            return HydrationReport::Offline;
        };

        if self
            .hydrating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Hydration already in flight, skipping");
            return HydrationReport::InProgress;
        }
        let _guard = HydrationGuard(&self.hydrating);

        let logs = match mirror.fetch_logs().await {
            Ok(logs) => {
                let count = logs.len();
                let mut store = self.store.write().await;
                store.replace_logs(logs);
                self.persist_logs(&store).await;
                CollectionSync::Replaced { count }
            }
            Err(e) => {
                tracing::warn!("Could not load journal from remote: {}", e);
                CollectionSync::Failed {
                    message: e.message(),
                }
            }
        };

        let cards = match mirror.fetch_cards().await {
            Ok(cards) => {
                let count = cards.len();
                let mut store = self.store.write().await;
                store.replace_cards(cards);
                self.persist_cards(&store).await;
                CollectionSync::Replaced { count }
            }
            Err(e) => {
                tracing::warn!("Could not load cards from remote: {}", e);
                CollectionSync::Failed {
                    message: e.message(),
                }
            }
        };

        tracing::info!("Remote hydration: logs {:?}, cards {:?}", logs, cards);
        HydrationReport::Completed { logs, cards }
    }

    async fn persist_logs(&self, store: &Store) {
        if let Err(e) = self.cache.save_logs(store.logs().master()).await {
            tracing::error!("Failed to persist journal: {}", e);
        }
    }

    async fn persist_cards(&self, store: &Store) {
        if let Err(e) = self.cache.save_cards(store.cards().master()).await {
            tracing::error!("Failed to persist cards: {}", e);
        }
    }

    // ==================== JOURNAL ====================

    pub async fn list_entries(&self) -> Vec<JournalEntry> {
        self.store.read().await.logs().working().to_vec()
    }

    pub async fn get_entry(&self, id: i64) -> Result<JournalEntry, AppError> {
        self.store
            .read()
            .await
            .logs()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", id)))
    }

    pub async fn create_entry(&self, request: &CreateEntryRequest) -> Result<JournalEntry, AppError> {
        let fields = request.validate()?;
        let now = Local::now();

        let mut store = self.store.write().await;
        let id = store.next_id(now.timestamp_millis());
        let entry = JournalEntry::new(id, &now, fields);
        store.add_log(entry.clone());
        self.persist_logs(&store).await;
        drop(store);

        self.remote.insert(RemoteTable::Logs, entry.id, &entry);
        tracing::info!("Created journal entry {}", entry.id);
        Ok(entry)
    }

    pub async fn update_entry(
        &self,
        id: i64,
        request: &UpdateEntryRequest,
    ) -> Result<JournalEntry, AppError> {
        let mut store = self.store.write().await;
        let mut entry = store
            .logs()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", id)))?;
        request.apply_to(&mut entry)?;
        store.put_log(entry.clone())?;
        self.persist_logs(&store).await;
        drop(store);

        self.remote.update(RemoteTable::Logs, id, &entry);
        tracing::info!("Updated journal entry {}", id);
        Ok(entry)
    }

    /// Returns whether anything was removed. Unknown ids are a no-op.
    pub async fn delete_entry(&self, id: i64) -> bool {
        let mut store = self.store.write().await;
        if store.remove_log(id).is_none() {
            tracing::debug!("Delete of unknown entry {} ignored", id);
            return false;
        }
        self.persist_logs(&store).await;
        drop(store);

        self.remote.delete(RemoteTable::Logs, id);
        tracing::info!("Deleted journal entry {}", id);
        true
    }

    pub async fn begin_edit(&self, id: i64) -> Result<JournalEntry, AppError> {
        let mut store = self.store.write().await;
        let entry = store.begin_edit(id)?.clone();
        tracing::debug!("Editing entry {}", id);
        Ok(entry)
    }

    pub async fn cancel_edit(&self) -> Option<i64> {
        self.store.write().await.cancel_edit()
    }

    pub async fn editing(&self) -> Option<i64> {
        self.store.read().await.editing()
    }

    // ==================== CARDS ====================

    pub async fn list_cards(&self) -> Vec<Flashcard> {
        self.store.read().await.cards().working().to_vec()
    }

    pub async fn get_card(&self, id: i64) -> Result<Flashcard, AppError> {
        self.store
            .read()
            .await
            .cards()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Card {} not found", id)))
    }

    pub async fn create_card(&self, request: &CreateCardRequest) -> Result<Flashcard, AppError> {
        let fields = request.validate()?;

        let mut store = self.store.write().await;
        let id = store.next_id(Utc::now().timestamp_millis());
        let card = Flashcard::new(id, fields);
        store.add_card(card.clone());
        self.persist_cards(&store).await;
        drop(store);

        self.remote.insert(RemoteTable::Cards, card.id, &card);
        tracing::info!("Created card {}", card.id);
        Ok(card)
    }

    pub async fn update_card(
        &self,
        id: i64,
        request: &UpdateCardRequest,
    ) -> Result<Flashcard, AppError> {
        let mut store = self.store.write().await;
        let mut card = store
            .cards()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Card {} not found", id)))?;
        request.apply_to(&mut card)?;
        store.put_card(card.clone())?;
        self.persist_cards(&store).await;
        drop(store);

        self.remote.update(RemoteTable::Cards, id, &card);
        tracing::info!("Updated card {}", id);
        Ok(card)
    }

    pub async fn delete_card(&self, id: i64) -> bool {
        let mut store = self.store.write().await;
        if store.remove_card(id).is_none() {
            tracing::debug!("Delete of unknown card {} ignored", id);
            return false;
        }
        self.persist_cards(&store).await;
        drop(store);

        self.remote.delete(RemoteTable::Cards, id);
        tracing::info!("Deleted card {}", id);
        true
    }

    pub async fn deck(&self) -> DeckView {
        self.store.read().await.deck()
    }

    pub async fn next_card(&self) -> DeckView {
        self.store.write().await.next_card()
    }

    pub async fn prev_card(&self) -> DeckView {
        self.store.write().await.prev_card()
    }

    // ==================== VIEWS ====================

    pub async fn search(&self, text: &str) -> SearchView {
        let mut store = self.store.write().await;
        store.search(text);
        SearchView {
            logs: store.logs().working().to_vec(),
            cards: store.cards().working().to_vec(),
        }
    }

    pub async fn streak(&self) -> StreakInfo {
        let store = self.store.read().await;
        StreakInfo::new(streak_days(
            store.logs().master().iter().map(|l| l.id),
            &Local::now(),
        ))
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        let store = self.store.read().await;
        StateSnapshot {
            logs: store.logs().working().to_vec(),
            cards: store.cards().working().to_vec(),
            query: store.query().map(str::to_string),
            editing_id: store.editing(),
            streak: StreakInfo::new(streak_days(
                store.logs().master().iter().map(|l| l.id),
                &Local::now(),
            )),
            online: self.remote.is_online(),
        }
    }

    // ==================== BACKUP ====================

    pub async fn export(&self) -> BackupDocument {
        let store = self.store.read().await;
        BackupDocument::new(
            store.logs().master().to_vec(),
            store.cards().master().to_vec(),
            Utc::now(),
        )
    }

    /// Replace whichever collections the document carries. The mirror is not touched.
    pub async fn import(&self, document: ImportDocument) -> ImportSummary {
        let mut store = self.store.write().await;
        let mut summary = ImportSummary {
            logs: None,
            cards: None,
        };

        if let Some(logs) = document.logs {
            summary.logs = Some(logs.len());
            store.replace_logs(logs);
            self.persist_logs(&store).await;
        }
        if let Some(cards) = document.cards {
            summary.cards = Some(cards.len());
            store.replace_cards(cards);
            self.persist_cards(&store).await;
        }

        tracing::info!("Imported backup: {:?}", summary);
        summary
    }

    /// Parse then import. Malformed input leaves state untouched.
    pub async fn import_raw(&self, raw: &str) -> Result<ImportSummary, AppError> {
        let document = ImportDocument::parse(raw)?;
        Ok(self.import(document).await)
    }
}

#[cfg(test)]
mod tests;
