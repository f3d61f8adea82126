//! SQLite backing for the drop store.
//!
//! # Responsibility
//! - Hand out connections whose `drops` schema is current and verified.
//!
//! # Invariants
//! - `PRAGMA user_version` mirrors the last applied migration.
//! - A connection is only returned once every table in `REQUIRED_TABLES`
//!   exists.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Tables the drop store reads and writes.
pub const REQUIRED_TABLES: &[&str] = &["drops"];

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Connecting failed; `mode` is `file` or `memory`, as in `db_open` logs.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// Statement failed on an open connection.
    Sqlite(rusqlite::Error),
    /// File was written by a newer build.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// Version is current but a drop-store table is absent.
    MissingTable { table: &'static str, version: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => {
                write!(f, "cannot open {mode} drop database: {source}")
            }
            Self::Sqlite(err) => write!(f, "drop database error: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "drop database is at schema v{found}; this build reads up to v{supported}"
            ),
            Self::MissingTable { table, version } => write!(
                f,
                "drop database claims schema v{version} but has no `{table}` table"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Sqlite(source) => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::MissingTable { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
