//! Remote mirror of the two collections.
//!
//! The mirror is optional and best-effort: the rest of the system treats every
//! failure here as recoverable and never waits on a write.

#[cfg(test)]
pub mod fake;
mod rest;

pub use rest::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RemoteConfig;
use crate::errors::AppError;
use crate::models::{Flashcard, JournalEntry};

/// Remote tables mirrored by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteTable {
    Logs,
    Cards,
}

impl RemoteTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteTable::Logs => "logs",
            RemoteTable::Cards => "cards",
        }
    }
}

impl std::fmt::Display for RemoteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD surface of the remote tabular store.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// All journal rows, newest id first.
    async fn fetch_logs(&self) -> Result<Vec<JournalEntry>, AppError>;

    /// All card rows in the store's natural order.
    async fn fetch_cards(&self) -> Result<Vec<Flashcard>, AppError>;

    async fn insert(&self, table: RemoteTable, row: Value) -> Result<(), AppError>;

    async fn update(&self, table: RemoteTable, id: i64, row: Value) -> Result<(), AppError>;

    async fn delete(&self, table: RemoteTable, id: i64) -> Result<(), AppError>;
}

/// A single remote write.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    Insert { table: RemoteTable, id: i64, row: Value },
    Update { table: RemoteTable, id: i64, row: Value },
    Delete { table: RemoteTable, id: i64 },
}

impl RemoteOp {
    pub fn table(&self) -> RemoteTable {
        match self {
            RemoteOp::Insert { table, .. }
            | RemoteOp::Update { table, .. }
            | RemoteOp::Delete { table, .. } => *table,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            RemoteOp::Insert { id, .. } | RemoteOp::Update { id, .. } | RemoteOp::Delete { id, .. } => {
                *id
            }
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            RemoteOp::Insert { .. } => "insert",
            RemoteOp::Update { .. } => "update",
            RemoteOp::Delete { .. } => "delete",
        }
    }

    /// Run this write against `mirror`.
    pub async fn apply(&self, mirror: &dyn RemoteMirror) -> Result<(), AppError> {
        match self {
            RemoteOp::Insert { table, row, .. } => mirror.insert(*table, row.clone()).await,
            RemoteOp::Update { table, id, row } => mirror.update(*table, *id, row.clone()).await,
            RemoteOp::Delete { table, id } => mirror.delete(*table, *id).await,
        }
    }
}

impl std::fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}#{}", self.verb(), self.table(), self.id())
    }
}

/// Build the mirror client, or `None` to run offline.
pub fn connect(config: Option<&RemoteConfig>) -> Option<Arc<dyn RemoteMirror>> {
    let Some(config) = config else {
        tracing::info!("No remote mirror configured, running offline");
        return None;
    };

    match RestMirror::new(config) {
        Ok(mirror) => {
            tracing::info!("Remote mirror client created for {}", config.url);
            Some(Arc::new(mirror))
        }
        Err(e) => {
            tracing::warn!("Remote mirror unavailable, running offline: {}", e);
            None
        }
    }
}
