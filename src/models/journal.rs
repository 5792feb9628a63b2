//! Journal entry model.

use chrono::{DateTime, Locale, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

use super::required;
use crate::errors::AppError;

/// A dated study note. `id` is the creation time in epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    pub content: String,
}

/// Request body for creating a journal entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Request body for updating a journal entry. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Validated, trimmed field values for a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub topic: String,
    pub content: String,
    pub tags: Option<String>,
}

impl CreateEntryRequest {
    pub fn validate(&self) -> Result<EntryFields, AppError> {
        Ok(EntryFields {
            topic: required(&self.topic, "Topic")?,
            content: required(&self.content, "Content")?,
            tags: normalize_tags(self.tags.as_deref()),
        })
    }
}

impl UpdateEntryRequest {
    /// Applies the provided fields to `entry`. Nothing is written unless every
    /// provided field is valid.
    pub fn apply_to(&self, entry: &mut JournalEntry) -> Result<(), AppError> {
        let topic = self
            .topic
            .as_deref()
            .map(|t| required(t, "Topic"))
            .transpose()?;
        let content = self
            .content
            .as_deref()
            .map(|c| required(c, "Content"))
            .transpose()?;

        if let Some(topic) = topic {
            entry.topic = topic;
        }
        if let Some(content) = content {
            entry.content = content;
        }
        if self.tags.is_some() {
            entry.tags = normalize_tags(self.tags.as_deref());
        }
        Ok(())
    }
}

impl JournalEntry {
    pub fn new<Tz: TimeZone>(id: i64, created: &DateTime<Tz>, fields: EntryFields) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id,
            date: display_date(created),
            topic: fields.topic,
            tags: fields.tags,
            content: fields.content,
        }
    }
}

/// Long-form Brazilian Portuguese date label, e.g. `quinta-feira, 16 de outubro de 2026`.
pub fn display_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format_localized("%A, %-d de %B de %Y", Locale::pt_BR)
        .to_string()
}

/// Missing and `null` labels both read as empty.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn normalize_tags(tags: Option<&str>) -> Option<String> {
    let tags = tags?.trim();
    if tags.is_empty() {
        None
    } else {
        Some(tags.to_string())
    }
}
