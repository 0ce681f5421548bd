//! Storage layer for rshare.
//!
//! This module provides a `SQLite`-backed key-value store holding JSON
//! documents under fixed keys. Reads are forgiving: a missing key, a failed
//! query, or a document that no longer parses all come back as the empty
//! default. Writes report their errors.

pub mod migrations;
pub mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use self::migrations::REVISION_KEY;
use self::schema::UPSERT_ENTRY;

/// Fixed keys of the shared ride board.
pub mod keys {
    /// Array of rider requests.
    pub const RIDER_REQUESTS: &str = "r_rider_requests";
    /// Array of driver posts.
    pub const DRIVER_POSTS: &str = "r_driver_posts";
    /// Array of completed rides.
    pub const HISTORY: &str = "r_history";
    /// Single driver profile object.
    pub const PROFILE: &str = "r_profile";
}

/// How long a writer waits for another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-value storage for the ride board.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets a watcher in another process read while we write
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw JSON document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store a raw document under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        // Take the write lock up front so two processes never hand out the same revision
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let revision = next_revision(&tx)?;
        tx.execute(
            UPSERT_ENTRY,
            params![key, value, revision, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        debug!("Wrote {} ({} bytes) at revision {}", key, value.len(), revision);
        Ok(())
    }

    /// Read a list stored under `key`.
    ///
    /// A missing key, a failed query, or a document that does not parse as a
    /// list of `T` yields an empty list.
    #[must_use]
    pub fn get_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.get_raw(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed list under {}: {}", key, e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Serialize `items` and store them under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn set_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.set_raw(key, &raw)
    }

    /// Read a single object stored under `key`.
    ///
    /// A missing key, a stored `null`, a failed query, or a malformed document
    /// yields `None`.
    #[must_use]
    pub fn get_one<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_raw(key) {
            Ok(Some(raw)) => serde_json::from_str::<Option<T>>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed object under {}: {}", key, e);
                None
            }),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn set_one<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    /// Remove the document stored under `key`.
    ///
    /// Returns `true` if something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?1", [key])?;
        if affected > 0 {
            debug!("Removed {}", key);
        }
        Ok(affected > 0)
    }

    /// Get the revision of every stored key.
    ///
    /// Revisions are unique across the store and only ever grow, so any write
    /// shows up as a changed revision, including a remove followed by a write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn revisions(&self) -> Result<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare("SELECT key, revision FROM entries")?;
        let revisions = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(revisions)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_keys: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        let last_revision = current_revision(&self.conn)?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_keys,
            last_revision,
            db_size_bytes,
        })
    }
}

fn current_revision(conn: &Connection) -> Result<i64> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [REVISION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(value) => value.parse().map_err(|_| {
            Error::internal(format!("corrupt revision counter: {value}"))
        }),
        None => Ok(0),
    }
}

/// Bump the store-wide revision counter and return the new value.
fn next_revision(conn: &Connection) -> Result<i64> {
    let next = current_revision(conn)? + 1;
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (REVISION_KEY, next.to_string()),
    )?;
    Ok(next)
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys currently stored.
    pub total_keys: i64,
    /// Revision handed out to the most recent write.
    pub last_revision: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
