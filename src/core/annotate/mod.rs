//! Annotation Pipeline
//!
//! Turns plain text with embedded markup tokens into an annotated
//! representation where each recognized token carries a renderable
//! decoration:
//!
//! - `[code]` emoticons become decoded, size-normalized inline images
//! - `@mentions` become profile links
//! - `#hashtags#` become topic links
//! - raw URLs become video, article, or plain external links
//!
//! Recognition, decoding, and store lookups run on background workers;
//! results are cached by content fingerprint so repeated renders of the same
//! text are free.

pub mod cache;
pub mod emoticon;
pub mod engine;
pub mod links;
pub mod models;
pub mod scanner;
pub mod task;

pub use cache::{AnnotationCache, ANNOTATION_CACHE_CAPACITY};
pub use emoticon::{EmoticonResolver, ImageScaler, EMOTICON_CACHE_CAPACITY};
pub use engine::{AnnotateOutcome, Annotator, AnnotatorConfig};
pub use links::{ClassifiedLink, LinkClassifier};
pub use models::{
    AnnotatedSpan, AnnotatedText, DecodedImage, Decoration, DisplayKind, LinkTarget, TokenKind,
    TokenSpan,
};
pub use scanner::TokenScanner;
pub use task::AnnotationTask;
