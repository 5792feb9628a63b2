//! Slot reads and writes.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Flashcard, JournalEntry};

/// Slot holding the journal entries.
pub const LOGS_SLOT: &str = "study_logs";
/// Slot holding the flashcards.
pub const CARDS_SLOT: &str = "study_cards";

/// Key-value cache of the two collections.
#[derive(Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read and decode a slot. `Ok(None)` when the slot was never written.
    pub async fn read_slot<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<Vec<T>>, AppError> {
        let row = sqlx::query("SELECT value FROM slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.get("value");
        let items = serde_json::from_str(&raw)
            .map_err(|e| AppError::Persistence(format!("Slot {} is corrupt: {}", key, e)))?;
        Ok(Some(items))
    }

    /// Load a slot, treating absent or unreadable data as an empty collection.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.read_slot(key).await {
            Ok(Some(items)) => items,
            Ok(None) => {
                tracing::debug!("Slot {} is empty", key);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Resetting slot {} to empty: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Replace the contents of a slot.
    pub async fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), AppError> {
        let raw = serde_json::to_string(items)
            .map_err(|e| AppError::Persistence(format!("Failed to encode {}: {}", key, e)))?;
        self.write_raw(key, &raw).await
    }

    pub(crate) async fn write_raw(&self, key: &str, raw: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO slots (key, value, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_logs(&self) -> Vec<JournalEntry> {
        self.load(LOGS_SLOT).await
    }

    pub async fn load_cards(&self) -> Vec<Flashcard> {
        self.load(CARDS_SLOT).await
    }

    pub async fn save_logs(&self, logs: &[JournalEntry]) -> Result<(), AppError> {
        self.save(LOGS_SLOT, logs).await
    }

    pub async fn save_cards(&self, cards: &[Flashcard]) -> Result<(), AppError> {
        self.save(CARDS_SLOT, cards).await
    }
}
