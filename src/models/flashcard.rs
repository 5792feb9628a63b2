//! Flashcard model.

use serde::{Deserialize, Serialize};

use super::required;
use crate::errors::AppError;

/// A two-sided study card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub id: i64,
    pub front: String,
    pub back: String,
}

/// Request body for creating a flashcard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCardRequest {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
}

/// Request body for updating a flashcard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
}

/// Validated, trimmed sides of a new card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub front: String,
    pub back: String,
}

impl CreateCardRequest {
    pub fn validate(&self) -> Result<CardFields, AppError> {
        Ok(CardFields {
            front: required(&self.front, "Front")?,
            back: required(&self.back, "Back")?,
        })
    }
}

impl Flashcard {
    pub fn new(id: i64, fields: CardFields) -> Self {
        Self {
            id,
            front: fields.front,
            back: fields.back,
        }
    }
}

impl UpdateCardRequest {
    pub fn apply_to(&self, card: &mut Flashcard) -> Result<(), AppError> {
        let front = self
            .front
            .as_deref()
            .map(|f| required(f, "Front"))
            .transpose()?;
        let back = self
            .back
            .as_deref()
            .map(|b| required(b, "Back"))
            .transpose()?;

        if let Some(front) = front {
            card.front = front;
        }
        if let Some(back) = back {
            card.back = back;
        }
        Ok(())
    }
}
