//! Annotation Data Model
//!
//! Spans recognized in source text and the decorations they resolve to.
//! An [`AnnotatedText`] is immutable once built and is shared as an `Arc`
//! between the cache and every consumer it is delivered to.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::Fingerprint;

// =============================================================================
// Token Spans
// =============================================================================

/// Token class recognized by the scanner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    /// Bracketed emoticon code, e.g. `[smile]`
    Emoticon,
    /// `@` followed by a user name
    Mention,
    /// `#topic#` pair
    Hashtag,
    /// Raw `http://` link
    Url,
}

/// A recognized markup region within source text.
///
/// Offsets are byte offsets into the source string; spans produced by one
/// scan are non-overlapping and ordered by `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpan {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Token class
    pub kind: TokenKind,
    /// The matched substring
    pub raw: String,
}

// =============================================================================
// Decorations
// =============================================================================

/// A decoded, size-normalized image ready for inline rendering.
///
/// Pixel data is shared, so clones are cheap and cache entries and delivered
/// results alias the same buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Raw pixel data
    pub data: Arc<[u8]>,
}

impl DecodedImage {
    /// Creates an image from raw pixel data.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }
}

/// How a clickable region should be presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayKind {
    /// Known video record: draw the video icon
    Video,
    /// Known non-video record: draw the article icon
    Article,
    /// Unknown link: plain clickable text
    Plain,
}

/// Semantic target of a clickable region
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LinkTarget {
    /// A user profile
    Profile { user: String },
    /// A topic page
    Topic { topic: String },
    /// An external web URL
    External { url: String },
    /// A known video record
    Video { record_id: String },
    /// A known article record
    Article { record_id: String },
}

/// Resolved decoration for one token span
#[derive(Clone, Debug, PartialEq)]
pub enum Decoration {
    /// Inline image replacing the span
    Image(DecodedImage),
    /// Clickable region with a semantic target
    Link {
        target: LinkTarget,
        display: DisplayKind,
    },
}

// =============================================================================
// Annotated Text
// =============================================================================

/// A token span plus its resolved decoration
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedSpan {
    /// The recognized span
    pub span: TokenSpan,
    /// What to render in its place
    pub decoration: Decoration,
}

/// Source text plus fully resolved decorations for every recognized span.
///
/// Immutable once constructed; shared as `Arc<AnnotatedText>`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedText {
    /// Fingerprint of the source text this was built from
    pub fingerprint: Fingerprint,
    /// Resolved spans, ordered by start offset
    pub spans: Vec<AnnotatedSpan>,
}
