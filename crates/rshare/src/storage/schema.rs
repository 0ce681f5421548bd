//! `SQLite` schema definitions for rshare.
//!
//! The store is a flat key-value table. Every write stamps its row with a
//! store-wide revision so that other processes can tell which keys changed.

/// SQL statement to create the entries table.
pub const CREATE_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    revision INTEGER NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Insert or replace an entry, keeping the key as the primary key.
pub const UPSERT_ENTRY: &str = r"
INSERT INTO entries (key, value, revision, updated_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(key) DO UPDATE SET
    value = excluded.value,
    revision = excluded.revision,
    updated_at = excluded.updated_at
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ENTRIES_TABLE,
    CREATE_METADATA_TABLE,
];
