//! Rendering-Surface Collaborator
//!
//! The consumer of annotation results. The pipeline never keeps a surface
//! alive: tasks hold `Weak<dyn RenderSurface>` and upgrade it atomically at
//! the moment of delivery, so a surface torn down mid-run simply makes the
//! task finish as `TargetGone`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::annotate::AnnotatedText;
use crate::core::SurfaceId;

/// A rendering surface that consumes annotated text.
///
/// `deliver` is invoked from an annotation worker. Implementations must
/// marshal the result onto their own interactive thread (a queued hand-off);
/// the `Arc<AnnotatedText>` is immutable, so no locking is needed for the
/// hand-off itself.
pub trait RenderSurface: Send + Sync {
    /// Stable identity for this surface, used to enforce the
    /// one-running-task-per-surface invariant. Obtain one via
    /// [`next_surface_id`].
    fn surface_id(&self) -> SurfaceId;

    /// Current line height in pixels, which determines inline icon size.
    /// May return 0 transiently before layout; tasks poll until non-zero.
    fn line_height(&self) -> u32;

    /// Accepts a finished annotation result.
    fn deliver(&self, text: Arc<AnnotatedText>);
}

/// Allocates a process-unique surface id.
pub fn next_surface_id() -> SurfaceId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_ids_are_unique() {
        let a = next_surface_id();
        let b = next_surface_id();
        assert_ne!(a, b);
    }
}
