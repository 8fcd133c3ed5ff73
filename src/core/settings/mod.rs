//! Settings Collaborator
//!
//! The pipeline depends on a single application setting: whether links should
//! open through the internal scheme. Annotation tasks read it exactly once,
//! at scan start, so a toggle mid-scan never produces a mixed result.
//!
//! The host application owns settings persistence; this module only defines
//! the read seam plus a runtime-toggleable implementation for hosts without
//! their own settings layer.

use std::sync::atomic::{AtomicBool, Ordering};

/// Read access to the one setting the pipeline consumes.
pub trait SettingsSource: Send + Sync {
    /// Whether produced link targets should carry the internal scheme.
    fn use_internal_links(&self) -> bool;
}

/// Atomic, runtime-toggleable settings implementation.
#[derive(Debug, Default)]
pub struct AnnotationSettings {
    use_internal_links: AtomicBool,
}

impl AnnotationSettings {
    /// Creates settings with the given internal-link mode.
    pub fn new(use_internal_links: bool) -> Self {
        Self {
            use_internal_links: AtomicBool::new(use_internal_links),
        }
    }

    /// Flips the internal-link mode. Takes effect for the next annotation
    /// request; running tasks keep the snapshot they read at scan start.
    pub fn set_use_internal_links(&self, enabled: bool) {
        self.use_internal_links.store(enabled, Ordering::Relaxed);
    }
}

impl SettingsSource for AnnotationSettings {
    fn use_internal_links(&self) -> bool {
        self.use_internal_links.load(Ordering::Relaxed)
    }
}
