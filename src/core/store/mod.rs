//! Store Collaborators
//!
//! External lookup stores the annotation pipeline depends on: the emoticon
//! byte store (bracketed code -> raw image bytes) and the link-record store
//! (URL fingerprint -> persisted record). Both are synchronous and may block;
//! they are only ever called from background annotation tasks.
//!
//! The traits are the contract. This module ships in-memory implementations
//! for tests and embedding; [`sqlite`] provides database-backed ones.

pub mod sqlite;

pub use sqlite::{SqliteEmoticonStore, SqliteLinkRecordStore};

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::{CoreResult, Fingerprint};

// =============================================================================
// Link Records
// =============================================================================

/// Record type tag persisted in the link-record store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkRecordKind {
    /// Full-length hosted video
    Video,
    /// Short-form video clip
    ShortVideo,
    /// Article or other non-video page
    Article,
}

impl LinkRecordKind {
    /// Both video sub-types display with the video icon.
    pub fn is_video(&self) -> bool {
        matches!(self, LinkRecordKind::Video | LinkRecordKind::ShortVideo)
    }
}

/// A persisted record for a known URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Record identifier in the backing store
    pub record_id: String,
    /// Record type tag
    pub kind: LinkRecordKind,
}

impl LinkRecord {
    /// Creates a new record.
    pub fn new(record_id: impl Into<String>, kind: LinkRecordKind) -> Self {
        Self {
            record_id: record_id.into(),
            kind,
        }
    }
}

// =============================================================================
// Store Traits
// =============================================================================

/// Emoticon byte store: maps an exact bracketed code (including the brackets)
/// to raw, undecoded image bytes.
pub trait EmoticonStore: Send + Sync {
    /// Looks up the raw image bytes for `code`. Absent codes are a valid
    /// outcome, not an error.
    fn lookup(&self, code: &str) -> CoreResult<Option<Vec<u8>>>;
}

/// Link-record store: maps the fingerprint of a normalized URL to a
/// persisted record, if one is known.
pub trait LinkRecordStore: Send + Sync {
    /// Looks up the record for a URL fingerprint.
    fn lookup(&self, fingerprint: &Fingerprint) -> CoreResult<Option<LinkRecord>>;
}

// =============================================================================
// In-Memory Implementations
// =============================================================================

/// HashMap-backed emoticon store for tests and database-free embedding.
#[derive(Default)]
pub struct MemoryEmoticonStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryEmoticonStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the bytes for `code`.
    pub fn insert(&self, code: impl Into<String>, bytes: Vec<u8>) {
        self.entries.lock().unwrap().insert(code.into(), bytes);
    }
}

impl EmoticonStore for MemoryEmoticonStore {
    fn lookup(&self, code: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(code).cloned())
    }
}

/// HashMap-backed link-record store for tests and database-free embedding.
#[derive(Default)]
pub struct MemoryLinkRecordStore {
    entries: Mutex<HashMap<Fingerprint, LinkRecord>>,
}

impl MemoryLinkRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record keyed by the fingerprint of `url`.
    pub fn insert_url(&self, url: &str, record: LinkRecord) {
        self.entries
            .lock()
            .unwrap()
            .insert(Fingerprint::of(url), record);
    }
}

impl LinkRecordStore for MemoryLinkRecordStore {
    fn lookup(&self, fingerprint: &Fingerprint) -> CoreResult<Option<LinkRecord>> {
        Ok(self.entries.lock().unwrap().get(fingerprint).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_record_kind_video_classes() {
        assert!(LinkRecordKind::Video.is_video());
        assert!(LinkRecordKind::ShortVideo.is_video());
        assert!(!LinkRecordKind::Article.is_video());
    }

    #[test]
    fn test_memory_emoticon_store_roundtrip() {
        let store = MemoryEmoticonStore::new();
        store.insert("[smile]", vec![1, 2, 3]);

        assert_eq!(store.lookup("[smile]").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.lookup("[frown]").unwrap(), None);
    }

    #[test]
    fn test_memory_link_store_keyed_by_url_fingerprint() {
        let store = MemoryLinkRecordStore::new();
        store.insert_url(
            "http://x.test/v",
            LinkRecord::new("rec_1", LinkRecordKind::Video),
        );

        let found = store.lookup(&Fingerprint::of("http://x.test/v")).unwrap();
        assert_eq!(found.unwrap().record_id, "rec_1");
        assert!(store
            .lookup(&Fingerprint::of("http://y.test"))
            .unwrap()
            .is_none());
    }
}
