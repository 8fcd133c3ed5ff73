//! Emoticon Resolver
//!
//! Maps a bracketed emoticon code to a decoded, size-normalized image via the
//! external byte store, with a bounded decoded-image cache in front.
//!
//! The cache key is the code alone: icon size is uniform per process run, so
//! the resolver records the size its resident entries were decoded at and
//! evicts everything when a different size arrives. The whole
//! check/fetch/decode/insert sequence runs under one lock, so concurrent
//! resolutions of the same code never decode twice.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::{debug, warn};

use crate::core::store::EmoticonStore;
use crate::core::CoreResult;

use super::models::DecodedImage;

/// Default bound on resident decoded images
pub const EMOTICON_CACHE_CAPACITY: usize = 30;

// =============================================================================
// Image Scaler Collaborator
// =============================================================================

/// Bitmap decode/resize primitive.
///
/// Decoding is platform territory; the pipeline only requires that raw bytes
/// become a [`DecodedImage`] rescaled to the target pixel size. Corrupt bytes
/// surface as [`crate::core::CoreError::DecodeFailed`].
pub trait ImageScaler: Send + Sync {
    /// Decodes `bytes` and rescales the result to `target_px`.
    fn decode_scaled(&self, bytes: &[u8], target_px: u32) -> CoreResult<DecodedImage>;
}

// =============================================================================
// Resolver
// =============================================================================

struct ResolverState {
    /// Icon size the resident entries were decoded at
    resident_size: u32,
    cache: LruCache<String, DecodedImage>,
}

/// Resolves emoticon codes to decoded, size-normalized images.
pub struct EmoticonResolver {
    store: Arc<dyn EmoticonStore>,
    scaler: Arc<dyn ImageScaler>,
    state: Mutex<ResolverState>,
}

impl EmoticonResolver {
    /// Creates a resolver with the default cache capacity.
    pub fn new(store: Arc<dyn EmoticonStore>, scaler: Arc<dyn ImageScaler>) -> Self {
        Self::with_capacity(store, scaler, EMOTICON_CACHE_CAPACITY)
    }

    /// Creates a resolver with an explicit cache capacity.
    pub fn with_capacity(
        store: Arc<dyn EmoticonStore>,
        scaler: Arc<dyn ImageScaler>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            scaler,
            state: Mutex::new(ResolverState {
                resident_size: 0,
                cache: LruCache::new(capacity),
            }),
        }
    }

    /// Resolves `code` to an image rescaled to `size` pixels.
    ///
    /// Returns `Ok(None)` when the store has no bytes for the code; the span
    /// is simply left undecorated. A size differing from the resident
    /// entries' size evicts the whole cache first.
    pub fn resolve(&self, code: &str, size: u32) -> CoreResult<Option<DecodedImage>> {
        let mut state = self.state.lock().unwrap();

        if state.resident_size != size {
            debug!(
                "icon size changed {} -> {}, evicting decoded images",
                state.resident_size, size
            );
            state.cache.clear();
            state.resident_size = size;
        }

        if let Some(image) = state.cache.get(code) {
            return Ok(Some(image.clone()));
        }

        let Some(bytes) = self.store.lookup(code)? else {
            return Ok(None);
        };

        let image = self.scaler.decode_scaled(&bytes, size).inspect_err(|e| {
            warn!("emoticon {} decode failed: {}", code, e);
        })?;

        state.cache.put(code.to_string(), image.clone());
        Ok(Some(image))
    }

    /// Evicts every resident decoded image.
    pub fn evict_all(&self) {
        self.state.lock().unwrap().cache.clear();
    }

    /// Number of resident decoded images.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().cache.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
