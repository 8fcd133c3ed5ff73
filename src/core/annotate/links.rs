//! Link Classifier
//!
//! Decides how a URL span should be rendered: as a known video link, a known
//! article link, or a plain external link. The decision comes from the
//! link-record store, keyed by the fingerprint of the normalized URL.
//!
//! The store call is synchronous and may block; classification therefore only
//! runs inside background annotation tasks.

use std::sync::Arc;

use tracing::debug;

use crate::core::store::LinkRecordStore;
use crate::core::{CoreResult, Fingerprint};

use super::models::{DisplayKind, LinkTarget};

/// A classified URL span: semantic target plus icon choice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedLink {
    /// Where the click should go
    pub target: LinkTarget,
    /// Which icon (if any) to draw
    pub display: DisplayKind,
}

/// Classifies URL spans against the link-record store.
pub struct LinkClassifier {
    store: Arc<dyn LinkRecordStore>,
    internal_scheme: String,
}

impl LinkClassifier {
    /// Creates a classifier using `internal_scheme` as the prefix applied to
    /// external targets in internal-link mode (and stripped before lookups).
    pub fn new(store: Arc<dyn LinkRecordStore>, internal_scheme: impl Into<String>) -> Self {
        Self {
            store,
            internal_scheme: internal_scheme.into(),
        }
    }

    /// Classifies a scanned URL.
    ///
    /// `internal_links` is the per-request settings snapshot: when set, plain
    /// external targets carry the internal scheme prefix. Known records are
    /// unaffected by the flag; their targets are record ids.
    pub fn classify(&self, url: &str, internal_links: bool) -> CoreResult<ClassifiedLink> {
        let normalized = url.strip_prefix(&self.internal_scheme).unwrap_or(url);
        let fingerprint = Fingerprint::of(normalized);

        match self.store.lookup(&fingerprint)? {
            Some(record) if record.kind.is_video() => {
                debug!("link {} -> video record {}", normalized, record.record_id);
                Ok(ClassifiedLink {
                    target: LinkTarget::Video {
                        record_id: record.record_id,
                    },
                    display: DisplayKind::Video,
                })
            }
            Some(record) => {
                debug!("link {} -> article record {}", normalized, record.record_id);
                Ok(ClassifiedLink {
                    target: LinkTarget::Article {
                        record_id: record.record_id,
                    },
                    display: DisplayKind::Article,
                })
            }
            None => {
                debug!("link {} -> no record, plain", normalized);
                let target = if internal_links {
                    format!("{}{}", self.internal_scheme, normalized)
                } else {
                    normalized.to_string()
                };
                Ok(ClassifiedLink {
                    target: LinkTarget::External { url: target },
                    display: DisplayKind::Plain,
                })
            }
        }
    }
}
