//! In-memory mirror for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use super::{RemoteMirror, RemoteTable};
use crate::errors::AppError;
use crate::models::{Flashcard, JournalEntry};

/// Write recorded by [`FakeMirror`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub verb: &'static str,
    pub table: RemoteTable,
    pub id: i64,
    pub row: Option<Value>,
}

#[derive(Default)]
pub struct FakeMirror {
    logs: Mutex<Vec<JournalEntry>>,
    cards: Mutex<Vec<Flashcard>>,
    calls: Mutex<Vec<RecordedCall>>,
    failing: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    insert_delay: Mutex<Option<Duration>>,
    notify: Notify,
}

impl FakeMirror {
    pub fn with_data(logs: Vec<JournalEntry>, cards: Vec<Flashcard>) -> Self {
        let mirror = Self::default();
        *mirror.logs.lock().unwrap() = logs;
        *mirror.cards.lock().unwrap() = cards;
        mirror
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    /// Slow down inserts so later writes could overtake them.
    pub fn set_insert_delay(&self, delay: Duration) {
        *self.insert_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until at least `count` writes were attempted.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<RecordedCall> {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                {
                    let calls = self.calls.lock().unwrap();
                    if calls.len() >= count {
                        return calls.clone();
                    }
                }
                notified.await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("remote writes did not arrive")
    }

    fn record(&self, verb: &'static str, table: RemoteTable, id: i64, row: Option<Value>) {
        self.calls.lock().unwrap().push(RecordedCall {
            verb,
            table,
            id,
            row,
        });
        self.notify.notify_waiters();
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Remote("mirror unreachable".to_string()));
        }
        Ok(())
    }

    async fn delay(&self, delay: &Mutex<Option<Duration>>) {
        let delay = *delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Keep the stored rows in step with successful writes. Rows that do not
    /// decode are recorded but not stored.
    fn store_row(&self, table: RemoteTable, row: &Value) {
        match table {
            RemoteTable::Logs => {
                if let Ok(entry) = serde_json::from_value::<JournalEntry>(row.clone()) {
                    let mut logs = self.logs.lock().unwrap();
                    logs.retain(|l| l.id != entry.id);
                    logs.push(entry);
                }
            }
            RemoteTable::Cards => {
                if let Ok(card) = serde_json::from_value::<Flashcard>(row.clone()) {
                    let mut cards = self.cards.lock().unwrap();
                    match cards.iter_mut().find(|c| c.id == card.id) {
                        Some(existing) => *existing = card,
                        None => cards.push(card),
                    }
                }
            }
        }
    }

    fn has_row(&self, table: RemoteTable, id: i64) -> bool {
        match table {
            RemoteTable::Logs => self.logs.lock().unwrap().iter().any(|l| l.id == id),
            RemoteTable::Cards => self.cards.lock().unwrap().iter().any(|c| c.id == id),
        }
    }

    fn drop_row(&self, table: RemoteTable, id: i64) {
        match table {
            RemoteTable::Logs => self.logs.lock().unwrap().retain(|l| l.id != id),
            RemoteTable::Cards => self.cards.lock().unwrap().retain(|c| c.id != id),
        }
    }
}

fn row_id(row: &Value) -> i64 {
    row.get("id").and_then(Value::as_i64).unwrap_or_default()
}

#[async_trait]
impl RemoteMirror for FakeMirror {
    async fn fetch_logs(&self) -> Result<Vec<JournalEntry>, AppError> {
        self.delay(&self.fetch_delay).await;
        self.check()?;
        let mut logs = self.logs.lock().unwrap().clone();
        logs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(logs)
    }

    async fn fetch_cards(&self) -> Result<Vec<Flashcard>, AppError> {
        self.delay(&self.fetch_delay).await;
        self.check()?;
        Ok(self.cards.lock().unwrap().clone())
    }

    async fn insert(&self, table: RemoteTable, row: Value) -> Result<(), AppError> {
        self.delay(&self.insert_delay).await;
        self.record("insert", table, row_id(&row), Some(row.clone()));
        self.check()?;
        self.store_row(table, &row);
        Ok(())
    }

    async fn update(&self, table: RemoteTable, id: i64, row: Value) -> Result<(), AppError> {
        self.record("update", table, id, Some(row.clone()));
        self.check()?;
        if self.has_row(table, id) {
            self.store_row(table, &row);
        }
        Ok(())
    }

    async fn delete(&self, table: RemoteTable, id: i64) -> Result<(), AppError> {
        self.record("delete", table, id, None);
        self.check()?;
        self.drop_row(table, id);
        Ok(())
    }
}
