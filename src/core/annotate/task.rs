//! Annotation Task
//!
//! One annotation run: poll the surface for its icon size, snapshot settings,
//! scan, resolve every span, publish. Runs entirely on a worker; the
//! interactive thread only ever sees the finished immutable result.
//!
//! Cancellation is cooperative: the flag is polled at each span boundary and
//! before publishing, never mid-decode. A cancelled run discards everything:
//! no partial delivery, no cache write. A vanished surface ends the run as
//! `TargetGone`: the result is still cached for future lookups but nobody is
//! delivered to.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::jobs::{CancelFlag, TaskHandle, TaskState};
use crate::core::settings::SettingsSource;
use crate::core::surface::RenderSurface;
use crate::core::{Fingerprint, TaskId};

use super::cache::AnnotationCache;
use super::emoticon::EmoticonResolver;
use super::links::LinkClassifier;
use super::models::{AnnotatedSpan, AnnotatedText, Decoration, DisplayKind, LinkTarget, TokenKind, TokenSpan};
use super::scanner::TokenScanner;

/// Delay between line-height polls while the surface has not laid out yet
const LAYOUT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A single scheduled annotation run for one consumer.
pub struct AnnotationTask {
    id: TaskId,
    created_at: String,
    text: String,
    fingerprint: Fingerprint,
    surface: Weak<dyn RenderSurface>,
    cancel: CancelFlag,
    scanner: Arc<TokenScanner>,
    resolver: Arc<EmoticonResolver>,
    classifier: Arc<LinkClassifier>,
    cache: Arc<AnnotationCache>,
    settings: Arc<dyn SettingsSource>,
}

impl AnnotationTask {
    /// Creates a pending task for `text` targeting `surface`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text: impl Into<String>,
        surface: Weak<dyn RenderSurface>,
        scanner: Arc<TokenScanner>,
        resolver: Arc<EmoticonResolver>,
        classifier: Arc<LinkClassifier>,
        cache: Arc<AnnotationCache>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        let text = text.into();
        let fingerprint = Fingerprint::of(&text);
        Self {
            id: ulid::Ulid::new().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            text,
            fingerprint,
            surface,
            cancel: CancelFlag::new(),
            scanner,
            resolver,
            classifier,
            cache,
            settings,
        }
    }

    /// Task ID
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Creation timestamp (RFC 3339)
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Fingerprint of the task's source text
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Returns a handle sharing this task's cancellation flag.
    pub fn handle(&self) -> TaskHandle {
        TaskHandle::new(self.id.clone(), self.cancel.clone())
    }

    /// Runs the task to a terminal state.
    pub async fn run(self) -> TaskState {
        if self.cancel.is_cancelled() {
            return TaskState::Cancelled;
        }

        let size = match self.poll_icon_size().await {
            Ok(size) => size,
            Err(state) => return state,
        };

        // Settings snapshot: read once at scan start, never mid-scan.
        let internal_links = self.settings.use_internal_links();

        let spans = self.scanner.scan(&self.text);
        let mut resolved = Vec::with_capacity(spans.len());

        for span in spans {
            if self.cancel.is_cancelled() {
                debug!("task {} cancelled mid-run, discarding partial result", self.id);
                return TaskState::Cancelled;
            }
            if let Some(annotated) = self.resolve_span(span, size, internal_links) {
                resolved.push(annotated);
            }
        }

        if self.cancel.is_cancelled() {
            debug!("task {} cancelled before publish", self.id);
            return TaskState::Cancelled;
        }

        let result = Arc::new(AnnotatedText {
            fingerprint: self.fingerprint,
            spans: resolved,
        });

        // Cache before the liveness check: a vanished consumer still leaves
        // future lookups warm.
        self.cache.put(self.fingerprint, Arc::clone(&result));

        match self.surface.upgrade() {
            Some(surface) => {
                surface.deliver(result);
                TaskState::Completed
            }
            None => {
                debug!("task {} target gone at delivery", self.id);
                TaskState::TargetGone
            }
        }
    }

    /// Waits for the surface to report a non-zero line height.
    ///
    /// The line height determines icon size and is 0 until the surface has
    /// laid out. Cancellation and surface teardown both unpark the wait.
    async fn poll_icon_size(&self) -> Result<u32, TaskState> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(TaskState::Cancelled);
            }

            let height = match self.surface.upgrade() {
                Some(surface) => surface.line_height(),
                None => return Err(TaskState::TargetGone),
            };
            if height > 0 {
                return Ok(height);
            }

            tokio::time::sleep(LAYOUT_POLL_INTERVAL).await;
        }
    }

    /// Resolves one span to its decoration.
    ///
    /// Returns `None` when the span stays undecorated (unknown emoticon code
    /// or failed decode); span-level failures never abort the task.
    fn resolve_span(
        &self,
        span: TokenSpan,
        size: u32,
        internal_links: bool,
    ) -> Option<AnnotatedSpan> {
        let decoration = match span.kind {
            TokenKind::Emoticon => match self.resolver.resolve(&span.raw, size) {
                Ok(Some(image)) => Some(Decoration::Image(image)),
                Ok(None) => None,
                Err(e) => {
                    warn!("task {}: emoticon {} skipped: {}", self.id, span.raw, e);
                    None
                }
            },
            TokenKind::Mention => Some(Decoration::Link {
                target: LinkTarget::Profile {
                    user: span.raw.trim_start_matches('@').to_string(),
                },
                display: DisplayKind::Plain,
            }),
            TokenKind::Hashtag => Some(Decoration::Link {
                target: LinkTarget::Topic {
                    topic: span.raw.trim_matches('#').to_string(),
                },
                display: DisplayKind::Plain,
            }),
            TokenKind::Url => match self.classifier.classify(&span.raw, internal_links) {
                Ok(link) => Some(Decoration::Link {
                    target: link.target,
                    display: link.display,
                }),
                Err(e) => {
                    // Degrade to a plain link rather than losing the span.
                    warn!("task {}: link lookup for {} failed: {}", self.id, span.raw, e);
                    Some(Decoration::Link {
                        target: LinkTarget::External {
                            url: span.raw.clone(),
                        },
                        display: DisplayKind::Plain,
                    })
                }
            },
        }?;

        Some(AnnotatedSpan { span, decoration })
    }
}
