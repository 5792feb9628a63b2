//! Bulk transfer document.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{Flashcard, JournalEntry};
use crate::errors::AppError;

/// Suggested file name for downloads.
pub const BACKUP_FILE_NAME: &str = "meus_estudos_backup.json";

/// Full export of both collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub logs: Vec<JournalEntry>,
    pub cards: Vec<Flashcard>,
    pub export_date: String,
}

impl BackupDocument {
    pub fn new(logs: Vec<JournalEntry>, cards: Vec<Flashcard>, at: DateTime<Utc>) -> Self {
        Self {
            logs,
            cards,
            export_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Accepted import shape. Each collection is replaced only when its key is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub logs: Option<Vec<JournalEntry>>,
    #[serde(default)]
    pub cards: Option<Vec<Flashcard>>,
}

impl ImportDocument {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|e| {
            tracing::warn!("Rejected backup document: {}", e);
            AppError::BadRequest(format!("Invalid backup document: {}", e))
        })
    }
}

/// Number of records restored per collection; `None` means the key was absent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub logs: Option<usize>,
    pub cards: Option<usize>,
}
