//! Local store — transactional record persistence over SQLite.
//!
//! DESIGN
//! ======
//! A single record collection (`items`) keyed by `id`. Every operation opens
//! exactly one transaction scoped to that table and resolves when it commits.
//! Records carry an opaque payload (a JSON object) next to the two fields the
//! store owns: `id`, assigned when missing, and `updatedAt`, stamped on every
//! write.
//!
//! The handle wraps the SQLx pool and is passed explicitly to consumers.
//! Cloning shares the pool; `close` shuts it for every clone.
//!
//! ERROR HANDLING
//! ==============
//! Failures to reach the database (closed pool, I/O, permission, full disk)
//! are `StorageUnavailable`; anything that aborts a transaction once the
//! database is reachable is `TransactionFailed`. A missing record is `None`,
//! never an error.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db;
use crate::error::ErrorCode;

/// Name of the store-owned identifier field.
pub const ID_FIELD: &str = "id";
/// Name of the store-owned last-modified field.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Caller-defined payload fields, opaque to the store.
pub type Fields = Map<String, Value>;

// SQLite primary result codes that mean the database itself is unreachable.
const SQLITE_PERM: i32 = 3;
const SQLITE_READONLY: i32 = 8;
const SQLITE_FULL: i32 = 13;
const SQLITE_CANTOPEN: i32 = 14;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "E_STORAGE_UNAVAILABLE",
            Self::TransactionFailed(_) => "E_TRANSACTION_FAILED",
            Self::CorruptRecord { .. } => "E_CORRUPT_RECORD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::TransactionFailed(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let unavailable = match &err {
            sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::Io(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::Tls(_) => true,
            sqlx::Error::Database(db_err) => db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .is_some_and(|code| {
                    matches!(code & 0xff, SQLITE_PERM | SQLITE_READONLY | SQLITE_FULL | SQLITE_CANTOPEN)
                }),
            _ => false,
        };

        if unavailable {
            Self::StorageUnavailable(err.to_string())
        } else {
            Self::TransactionFailed(err.to_string())
        }
    }
}

/// A record as handed to [`LocalStore::put`]. `id` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), fields: Fields::new() }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Wrap a typed payload. The payload must serialize to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a serde error if serialization fails or yields a non-object.
    pub fn from_payload<T: Serialize>(id: Option<String>, payload: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(payload)? {
            Value::Object(fields) => Ok(Self { id, fields }),
            _ => Err(<serde_json::Error as serde::ser::Error>::custom(
                "record payload must serialize to a JSON object",
            )),
        }
    }
}

/// A record as persisted: `id` and `updatedAt` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
    #[serde(flatten)]
    pub fields: Fields,
}

impl StoredRecord {
    /// Decode the payload into a caller type.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| StoreError::CorruptRecord { id: self.id.clone(), reason: e.to_string() })
    }
}

// =============================================================================
// STORE HANDLE
// =============================================================================

/// Handle to the local record collection.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the database cannot be opened or the
    /// schema cannot be created.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = db::init_pool(database_url, max_connections)
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        info!(schema_version = db::SCHEMA_VERSION, "local store opened");
        Ok(Self { pool })
    }

    /// Close the underlying pool. Subsequent operations fail with
    /// `StorageUnavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("local store closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create or fully replace a record.
    ///
    /// A missing or empty `id` is replaced by a fresh UUID. `updatedAt` is
    /// always stamped with the current time; any caller-supplied value is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` or `TransactionFailed`.
    pub async fn put(&self, record: Record) -> Result<StoredRecord, StoreError> {
        let Record { id, mut fields } = record;
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };
        fields.remove(ID_FIELD);
        fields.remove(UPDATED_AT_FIELD);

        let updated_at = now_ms();
        let data = serde_json::to_string(&fields).map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO items (id, updated_at, data) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at, data = excluded.data",
        )
        .bind(&id)
        .bind(updated_at)
        .bind(&data)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;

        debug!(%id, updated_at, "record stored");
        Ok(StoredRecord { id, updated_at, fields })
    }

    /// Point lookup. `Ok(None)` when no record has this id.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable`, `TransactionFailed`, or `CorruptRecord`.
    pub async fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, (String, i64, String)>("SELECT id, updated_at, data FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(tx.as_mut())
            .await?;
        tx.commit().await?;

        row.map(decode_row).transpose()
    }

    /// Remove a record. Removing a missing id still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` or `TransactionFailed`.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;

        debug!(%id, removed = result.rows_affected(), "record deleted");
        Ok(())
    }

    /// Every record, in insertion order. Empty when the collection is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable`, `TransactionFailed`, or `CorruptRecord`.
    pub async fn all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query_as::<_, (String, i64, String)>("SELECT id, updated_at, data FROM items ORDER BY rowid")
            .fetch_all(tx.as_mut())
            .await?;
        tx.commit().await?;

        rows.into_iter().map(decode_row).collect()
    }

    /// Remove every record in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` or `TransactionFailed`.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM items").execute(tx.as_mut()).await?;
        tx.commit().await?;

        debug!(removed = result.rows_affected(), "collection cleared");
        Ok(())
    }

    /// Remove every record whose id does not start with `prefix`, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Same as [`LocalStore::clear`].
    pub async fn clear_except(&self, prefix: &str) -> Result<(), StoreError> {
        let prefix_len = i64::try_from(prefix.chars().count()).unwrap_or(i64::MAX);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM items WHERE substr(id, 1, ?) <> ?")
            .bind(prefix_len)
            .bind(prefix)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;

        debug!(removed = result.rows_affected(), kept = prefix, "collection cleared");
        Ok(())
    }
}

fn decode_row((id, updated_at, data): (String, i64, String)) -> Result<StoredRecord, StoreError> {
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(fields)) => Ok(StoredRecord { id, updated_at, fields }),
        Ok(_) => Err(StoreError::CorruptRecord { id, reason: "payload is not a JSON object".into() }),
        Err(e) => Err(StoreError::CorruptRecord { id, reason: e.to_string() }),
    }
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
