//! Annotext Core Library
//!
//! Asynchronous inline-markup annotation engine. Recognizes emoticon codes,
//! `@mentions`, `#hashtags#`, and raw URLs in plain text and resolves each
//! into a renderable decoration (a decoded inline image or a typed link)
//! without ever blocking the interactive thread.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use annotext::core::annotate::{Annotator, AnnotatorConfig, AnnotateOutcome};
//!
//! let annotator = Annotator::new(emoticon_store, link_store, scaler, settings,
//!     AnnotatorConfig::default());
//! annotator.start(); // inside a tokio runtime
//!
//! match annotator.annotate(&surface, "hello [smile] @bob")? {
//!     AnnotateOutcome::Cached(text) => render(text),
//!     AnnotateOutcome::Scheduled(_) => {} // result arrives via surface.deliver
//!     AnnotateOutcome::Plain => render_raw(),
//! }
//! ```

pub mod core;

pub use crate::core::annotate::{
    AnnotateOutcome, AnnotatedSpan, AnnotatedText, Annotator, AnnotatorConfig, DecodedImage,
    Decoration, DisplayKind, ImageScaler, LinkTarget, TokenKind, TokenSpan,
};
pub use crate::core::settings::{AnnotationSettings, SettingsSource};
pub use crate::core::store::{
    EmoticonStore, LinkRecord, LinkRecordKind, LinkRecordStore, MemoryEmoticonStore,
    MemoryLinkRecordStore, SqliteEmoticonStore, SqliteLinkRecordStore,
};
pub use crate::core::surface::{next_surface_id, RenderSurface};
pub use crate::core::{CoreError, CoreResult, Fingerprint, SurfaceId, TaskId};
