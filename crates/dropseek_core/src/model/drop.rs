//! Drop domain model.
//!
//! # Responsibility
//! - Define the persisted drop record and the user-supplied draft.
//! - Normalize author/password defaults before anything reaches storage.
//!
//! # Invariants
//! - `name` and `message` are non-empty after trimming.
//! - `password == None` means the drop is unlocked; an empty password is
//!   normalized to `None` at draft time.
//! - A drop is expired once `created_at_ms < now - DROP_TTL_MS`, the same
//!   predicate the expiry sweep deletes by.

use crate::model::coordinate::Coordinate;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned identifier for a persisted drop.
pub type DropId = Uuid;

/// Author shown when the creator leaves the field empty.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Lifetime of an unread drop, in milliseconds (24 hours).
pub const DROP_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Returns the creation-time cutoff: drops created strictly before it are expired.
pub fn expiry_cutoff(now_ms: i64) -> i64 {
    now_ms.saturating_sub(DROP_TTL_MS)
}

/// Validation failure for drop creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropValidationError {
    EmptyName,
    EmptyMessage,
    /// Creator location is unknown or non-finite.
    MissingOrigin,
}

impl Display for DropValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "drop name cannot be empty"),
            Self::EmptyMessage => write!(f, "drop message cannot be empty"),
            Self::MissingOrigin => write!(f, "drop origin location is unavailable"),
        }
    }
}

impl Error for DropValidationError {}

/// Creation input collected from the compose form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropDraft {
    pub name: String,
    pub message: String,
    /// Empty or whitespace-only falls back to `DEFAULT_AUTHOR`.
    pub author: String,
    /// Empty string is treated as "no password".
    pub password: Option<String>,
}

impl DropDraft {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Validates required fields and stamps origin/time into a storable record.
    ///
    /// # Errors
    /// - `EmptyName` / `EmptyMessage` when the field is empty after trimming.
    /// - `MissingOrigin` when `origin` is absent or non-finite.
    pub fn into_record(
        self,
        origin: Option<Coordinate>,
        now_ms: i64,
    ) -> Result<NewDrop, DropValidationError> {
        if self.name.trim().is_empty() {
            return Err(DropValidationError::EmptyName);
        }
        if self.message.trim().is_empty() {
            return Err(DropValidationError::EmptyMessage);
        }
        let location = origin
            .and_then(Coordinate::present)
            .ok_or(DropValidationError::MissingOrigin)?;

        let author = match self.author.trim() {
            "" => DEFAULT_AUTHOR.to_string(),
            trimmed => trimmed.to_string(),
        };
        let password = self.password.filter(|value| !value.is_empty());

        Ok(NewDrop {
            name: self.name,
            message: self.message,
            author,
            password,
            location,
            created_at_ms: now_ms,
        })
    }
}

/// Validated drop record ready for insertion; identity is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrop {
    pub name: String,
    pub message: String,
    pub author: String,
    pub password: Option<String>,
    pub location: Coordinate,
    /// Unix epoch milliseconds.
    pub created_at_ms: i64,
}

impl NewDrop {
    /// Attaches the store-assigned identity.
    pub fn into_drop(self, id: DropId) -> DropRecord {
        DropRecord {
            id,
            name: self.name,
            message: self.message,
            author: self.author,
            password: self.password,
            location: self.location,
            created_at_ms: self.created_at_ms,
        }
    }
}

/// Persisted, immutable drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropRecord {
    pub id: DropId,
    pub name: String,
    pub message: String,
    pub author: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub location: Coordinate,
    /// Unix epoch milliseconds.
    pub created_at_ms: i64,
}

impl DropRecord {
    /// Returns whether opening requires a password.
    pub fn is_locked(&self) -> bool {
        self.password.is_some()
    }

    /// Returns whether the drop is past its lifetime at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.created_at_ms < expiry_cutoff(now_ms)
    }
}
