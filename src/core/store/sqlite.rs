//! SQLite Store Implementations
//!
//! Database-backed reference implementations of the store traits, mirroring
//! the embedded databases the pipeline was designed against: a `emoticons`
//! table keyed by bracketed code, and a `link_records` table keyed by URL
//! fingerprint with the record persisted as JSON.
//!
//! Connections are mutex-wrapped so one store instance can be shared by all
//! annotation workers.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use crate::core::{CoreResult, Fingerprint};

use super::{EmoticonStore, LinkRecord, LinkRecordStore};

// =============================================================================
// Emoticon Store
// =============================================================================

/// SQLite-backed emoticon byte store
pub struct SqliteEmoticonStore {
    conn: Mutex<Connection>,
}

impl SqliteEmoticonStore {
    /// Opens (or creates) the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates an in-memory store (for testing)
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> CoreResult<()> {
        self.conn.lock().unwrap().execute_batch(
            r#"
            -- Emoticons table: bracketed code -> raw image bytes
            CREATE TABLE IF NOT EXISTS emoticons (
                code TEXT PRIMARY KEY,
                image BLOB NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Inserts or replaces the image bytes for a code
    pub fn insert(&self, code: &str, image: &[u8]) -> CoreResult<()> {
        self.conn.lock().unwrap().execute(
            "INSERT OR REPLACE INTO emoticons (code, image) VALUES (?1, ?2)",
            rusqlite::params![code, image],
        )?;
        Ok(())
    }
}

impl EmoticonStore for SqliteEmoticonStore {
    fn lookup(&self, code: &str) -> CoreResult<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        let bytes = conn
            .query_row(
                "SELECT image FROM emoticons WHERE code = ?1",
                [code],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(bytes)
    }
}

// =============================================================================
// Link Record Store
// =============================================================================

/// SQLite-backed link-record store
pub struct SqliteLinkRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteLinkRecordStore {
    /// Opens (or creates) the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates an in-memory store (for testing)
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> CoreResult<()> {
        self.conn.lock().unwrap().execute_batch(
            r#"
            -- Link records: URL fingerprint (hex) -> record JSON
            CREATE TABLE IF NOT EXISTS link_records (
                fingerprint TEXT PRIMARY KEY,
                record TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Inserts a record keyed by the fingerprint of `url`
    pub fn insert_url(&self, url: &str, record: &LinkRecord) -> CoreResult<()> {
        let json = serde_json::to_string(record)?;
        self.conn.lock().unwrap().execute(
            "INSERT OR REPLACE INTO link_records (fingerprint, record) VALUES (?1, ?2)",
            rusqlite::params![Fingerprint::of(url).to_hex(), json],
        )?;
        Ok(())
    }
}

impl LinkRecordStore for SqliteLinkRecordStore {
    fn lookup(&self, fingerprint: &Fingerprint) -> CoreResult<Option<LinkRecord>> {
        let conn = self.conn.lock().unwrap();
        let json = conn
            .query_row(
                "SELECT record FROM link_records WHERE fingerprint = ?1",
                [fingerprint.to_hex()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
