//! Expiry cleanup entry point for scheduled invokers.
//!
//! # Responsibility
//! - Run one expiry sweep and fold the outcome into a serializable report.
//!
//! # Invariants
//! - Never panics and never returns `Err`; failures become
//!   `CleanupReport::Error` so the invoker can map them to a status code.
//! - Safe to run concurrently with itself and with interactive consumption,
//!   since every delete it issues is idempotent.

use crate::repo::drop_store::DropStore;
use crate::service::drop_service::DropService;
use log::info;
use serde::Serialize;

/// Outcome of one cleanup invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupReport {
    Ok {
        #[serde(rename = "deletedCount")]
        deleted_count: u64,
    },
    Error {
        message: String,
    },
}

impl CleanupReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Sweeps drops that expired as of `now_ms`.
pub async fn run_cleanup<S: DropStore>(service: &DropService<S>, now_ms: i64) -> CleanupReport {
    match service.sweep_expired(now_ms).await {
        Ok(0) => {
            info!("event=cleanup_run module=cleanup status=ok deleted_count=0 note=nothing_expired");
            CleanupReport::Ok { deleted_count: 0 }
        }
        Ok(deleted_count) => {
            info!("event=cleanup_run module=cleanup status=ok deleted_count={deleted_count}");
            CleanupReport::Ok { deleted_count }
        }
        Err(err) => CleanupReport::Error {
            message: format!("error deleting expired drops: {err}"),
        },
    }
}
