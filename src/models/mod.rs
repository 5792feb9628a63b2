//! Data models for the study journal.
//!
//! Field names match the cached JSON, the backup format and the remote tables.

mod backup;
mod flashcard;
mod journal;
mod snapshot;

pub use backup::*;
pub use flashcard::*;
pub use journal::*;
pub use snapshot::*;

/// Trim a required field, rejecting blank input.
pub(crate) fn required(value: &str, label: &str) -> Result<String, crate::errors::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::errors::AppError::Validation(format!(
            "{} is required",
            label
        )));
    }
    Ok(trimmed.to_string())
}
