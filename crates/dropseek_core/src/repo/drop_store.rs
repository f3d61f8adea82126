//! Drop collection contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the four collection operations the lifecycle needs: insert,
//!   list, delete by id, and batched delete by creation time.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `insert` assigns identity; callers never choose drop ids.
//! - `delete_by_id` succeeds whether or not the row exists.
//! - `delete_created_before` removes all qualifying rows in one transaction.
//! - `list_all` returns drops in insertion order.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::coordinate::Coordinate;
use crate::model::drop::{DropId, DropRecord, NewDrop};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const DROP_SELECT_SQL: &str = "SELECT
    id,
    name,
    message,
    author,
    password,
    latitude,
    longitude,
    created_at
FROM drops";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure talking to the drop collection.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A persisted row could not be mapped back into a `DropRecord`.
    InvalidData(String),
    /// Backend could not service the call (lock poisoned, task cancelled).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted drop data: {message}"),
            Self::Unavailable(message) => write!(f, "drop store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Shared keyed collection of drops.
///
/// Every call is a round trip to the backing store and is awaited by the
/// caller without blocking other event delivery.
#[async_trait]
pub trait DropStore: Send + Sync {
    async fn insert(&self, record: &NewDrop) -> StoreResult<DropId>;
    async fn list_all(&self) -> StoreResult<Vec<DropRecord>>;
    async fn delete_by_id(&self, id: DropId) -> StoreResult<()>;
    /// Deletes every drop with `created_at < cutoff_ms`; returns the count.
    async fn delete_created_before(&self, cutoff_ms: i64) -> StoreResult<u64>;
}

#[async_trait]
impl<S: DropStore + ?Sized> DropStore for Arc<S> {
    async fn insert(&self, record: &NewDrop) -> StoreResult<DropId> {
        (**self).insert(record).await
    }

    async fn list_all(&self) -> StoreResult<Vec<DropRecord>> {
        (**self).list_all().await
    }

    async fn delete_by_id(&self, id: DropId) -> StoreResult<()> {
        (**self).delete_by_id(id).await
    }

    async fn delete_created_before(&self, cutoff_ms: i64) -> StoreResult<u64> {
        (**self).delete_created_before(cutoff_ms).await
    }
}

/// SQLite-backed drop collection.
///
/// Statements run on the blocking pool; the connection is serialized behind a
/// mutex so clones of this store can be shared between tasks.
#[derive(Clone)]
pub struct SqliteDropStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDropStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                StoreError::Unavailable("sqlite connection lock poisoned".to_string())
            })?;
            op(&mut guard)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("sqlite task failed: {err}")))?
    }
}

#[async_trait]
impl DropStore for SqliteDropStore {
    async fn insert(&self, record: &NewDrop) -> StoreResult<DropId> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO drops (
                    id,
                    name,
                    message,
                    author,
                    password,
                    latitude,
                    longitude,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    id.to_string(),
                    record.name.as_str(),
                    record.message.as_str(),
                    record.author.as_str(),
                    record.password.as_deref(),
                    record.location.latitude,
                    record.location.longitude,
                    record.created_at_ms,
                ],
            )?;
            Ok(id)
        })
        .await
    }

    async fn list_all(&self) -> StoreResult<Vec<DropRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{DROP_SELECT_SQL} ORDER BY rowid ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut drops = Vec::new();
            while let Some(row) = rows.next()? {
                drops.push(parse_drop_row(row)?);
            }
            Ok(drops)
        })
        .await
    }

    async fn delete_by_id(&self, id: DropId) -> StoreResult<()> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM drops WHERE id = ?1;", [id.to_string()])?;
            Ok(())
        })
        .await
    }

    async fn delete_created_before(&self, cutoff_ms: i64) -> StoreResult<u64> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM drops WHERE created_at < ?1;", [cutoff_ms])?;
            tx.commit()?;
            Ok(removed as u64)
        })
        .await
    }
}

fn parse_drop_row(row: &Row<'_>) -> StoreResult<DropRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in drops.id"))
    })?;

    let location = Coordinate::new(row.get("latitude")?, row.get("longitude")?)
        .present()
        .ok_or_else(|| {
            StoreError::InvalidData(format!("non-finite location for drop `{id}`"))
        })?;

    Ok(DropRecord {
        id,
        name: row.get("name")?,
        message: row.get("message")?,
        author: row.get("author")?,
        password: row
            .get::<_, Option<String>>("password")?
            .filter(|value| !value.is_empty()),
        location,
        created_at_ms: row.get("created_at")?,
    })
}
