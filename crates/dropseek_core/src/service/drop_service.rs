//! Drop lifecycle service.
//!
//! # Responsibility
//! - Create drops from validated drafts at a known origin.
//! - Verify passwords before a drop may be read.
//! - Destroy drops on consumption and on expiry.
//!
//! # Invariants
//! - Invalid input is rejected before any store call.
//! - `consume` is idempotent; repeating it is indistinguishable from once.
//! - Store failures surface as `DropError::StoreUnavailable`; nothing here
//!   retries on its own.
//! - Logs carry ids, counts and durations only, never drop content.

use crate::model::coordinate::Coordinate;
use crate::model::drop::{expiry_cutoff, DropDraft, DropId, DropRecord, DropValidationError};
use crate::repo::drop_store::{DropStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type DropResult<T> = Result<T, DropError>;

/// Lifecycle failure surfaced to session and invoker callers.
#[derive(Debug)]
pub enum DropError {
    /// Empty required field or missing origin; no store call was made.
    InvalidInput(DropValidationError),
    /// Unlock attempt did not match; recoverable by re-prompting.
    IncorrectPassword,
    /// Transient collection failure; retry policy belongs to the caller.
    StoreUnavailable(StoreError),
}

impl Display for DropError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::IncorrectPassword => write!(f, "incorrect password"),
            Self::StoreUnavailable(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DropError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::IncorrectPassword => None,
            Self::StoreUnavailable(err) => Some(err),
        }
    }
}

impl From<DropValidationError> for DropError {
    fn from(value: DropValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<StoreError> for DropError {
    fn from(value: StoreError) -> Self {
        Self::StoreUnavailable(value)
    }
}

/// Checks an unlock attempt against a drop's password.
///
/// A drop without a password accepts every attempt, including an empty one.
pub fn verify_password(drop: &DropRecord, attempt: &str) -> DropResult<()> {
    match drop.password.as_deref() {
        None => Ok(()),
        Some(expected) if expected == attempt => Ok(()),
        Some(_) => Err(DropError::IncorrectPassword),
    }
}

/// Lifecycle facade over a drop collection.
pub struct DropService<S: DropStore> {
    store: S,
}

impl<S: DropStore> DropService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates `draft`, stamps `origin` and `now_ms`, and persists it.
    ///
    /// # Errors
    /// - `InvalidInput` for empty name/message or absent origin.
    /// - `StoreUnavailable` when the insert fails.
    pub async fn create(
        &self,
        draft: DropDraft,
        origin: Option<Coordinate>,
        now_ms: i64,
    ) -> DropResult<DropRecord> {
        let record = draft.into_record(origin, now_ms).map_err(|err| {
            warn!("event=drop_create module=service status=rejected reason={err:?}");
            err
        })?;

        let started_at = Instant::now();
        match self.store.insert(&record).await {
            Ok(id) => {
                info!(
                    "event=drop_create module=service status=ok drop_id={id} locked={} duration_ms={}",
                    record.password.is_some(),
                    started_at.elapsed().as_millis()
                );
                Ok(record.into_drop(id))
            }
            Err(err) => {
                error!(
                    "event=drop_create module=service status=error error_code=store_unavailable error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Verifies an unlock attempt; see [`verify_password`].
    pub fn unlock(&self, drop: &DropRecord, attempt: &str) -> DropResult<()> {
        let result = verify_password(drop, attempt);
        let status = if result.is_ok() { "ok" } else { "rejected" };
        info!(
            "event=drop_unlock module=service status={status} drop_id={} locked={}",
            drop.id,
            drop.is_locked()
        );
        result
    }

    /// Permanently deletes a drop; deleting a missing id is a no-op.
    pub async fn consume(&self, id: DropId) -> DropResult<()> {
        let started_at = Instant::now();
        match self.store.delete_by_id(id).await {
            Ok(()) => {
                info!(
                    "event=drop_consume module=service status=ok drop_id={id} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=drop_consume module=service status=error drop_id={id} error_code=store_unavailable error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Deletes every drop created more than 24 hours before `now_ms`.
    ///
    /// Returns the number of drops removed; `0` when none qualify.
    pub async fn sweep_expired(&self, now_ms: i64) -> DropResult<u64> {
        let cutoff = expiry_cutoff(now_ms);
        let started_at = Instant::now();
        match self.store.delete_created_before(cutoff).await {
            Ok(removed) => {
                info!(
                    "event=drop_sweep module=service status=ok cutoff_ms={cutoff} deleted_count={removed} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(removed)
            }
            Err(err) => {
                error!(
                    "event=drop_sweep module=service status=error cutoff_ms={cutoff} error_code=store_unavailable error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Loads a snapshot of every live drop.
    pub async fn list_drops(&self) -> DropResult<Vec<DropRecord>> {
        self.store.list_all().await.map_err(|err| {
            error!("event=drop_list module=service status=error error_code=store_unavailable error={err}");
            DropError::from(err)
        })
    }
}
