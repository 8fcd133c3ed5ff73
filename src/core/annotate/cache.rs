//! Annotation Cache
//!
//! Memory cache of finished annotation results, keyed by the content
//! fingerprint of the source text. Repeated renders of identical text are
//! free. Entries never go stale by time, since correctness depends only on
//! content equality, so the only eviction is the LRU capacity bound.
//!
//! Lookups and insertions are individually atomic; a racing get+put pair may
//! duplicate annotation work, which is benign.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::core::Fingerprint;

use super::models::AnnotatedText;

/// Default bound on resident annotation results
pub const ANNOTATION_CACHE_CAPACITY: usize = 200;

/// Bounded LRU cache of annotation results.
pub struct AnnotationCache {
    entries: Mutex<LruCache<Fingerprint, Arc<AnnotatedText>>>,
}

impl AnnotationCache {
    /// Creates a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(ANNOTATION_CACHE_CAPACITY)
    }

    /// Creates a cache with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Looks up a result by fingerprint, marking it most recently used.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<AnnotatedText>> {
        self.entries.lock().unwrap().get(fingerprint).cloned()
    }

    /// Inserts a finished result, evicting the least recently used entry if
    /// the cache is at capacity.
    pub fn put(&self, fingerprint: Fingerprint, text: Arc<AnnotatedText>) {
        self.entries.lock().unwrap().put(fingerprint, text);
    }

    /// Evicts every entry.
    pub fn evict_all(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a fingerprint is resident, without touching recency.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.lock().unwrap().contains(fingerprint)
    }
}

impl Default for AnnotationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> (Fingerprint, Arc<AnnotatedText>) {
        let fingerprint = Fingerprint::of(text);
        (
            fingerprint,
            Arc::new(AnnotatedText {
                fingerprint,
                spans: Vec::new(),
            }),
        )
    }

    #[test]
    fn test_get_after_put() {
        let cache = AnnotationCache::new();
        let (fp, text) = entry("hello");

        assert!(cache.get(&fp).is_none());
        cache.put(fp, text.clone());
        assert!(Arc::ptr_eq(&cache.get(&fp).unwrap(), &text));
    }

    #[test]
    fn test_eviction_bound_keeps_most_recent() {
        let cache = AnnotationCache::new();

        for i in 0..ANNOTATION_CACHE_CAPACITY + 5 {
            let (fp, text) = entry(&format!("text {}", i));
            cache.put(fp, text);
        }

        assert_eq!(cache.len(), ANNOTATION_CACHE_CAPACITY);

        // The first five inserts were evicted; everything newer is resident.
        for i in 0..5 {
            assert!(!cache.contains(&Fingerprint::of(&format!("text {}", i))));
        }
        for i in 5..ANNOTATION_CACHE_CAPACITY + 5 {
            assert!(cache.contains(&Fingerprint::of(&format!("text {}", i))));
        }
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = AnnotationCache::with_capacity(2);
        let (fp_a, a) = entry("a");
        let (fp_b, b) = entry("b");
        let (fp_c, c) = entry("c");

        cache.put(fp_a, a);
        cache.put(fp_b, b);

        // Touch "a" so "b" becomes the eviction candidate.
        cache.get(&fp_a);
        cache.put(fp_c, c);

        assert!(cache.contains(&fp_a));
        assert!(!cache.contains(&fp_b));
        assert!(cache.contains(&fp_c));
    }

    #[test]
    fn test_evict_all() {
        let cache = AnnotationCache::new();
        let (fp, text) = entry("hello");
        cache.put(fp, text);

        cache.evict_all();
        assert!(cache.is_empty());
    }
}
