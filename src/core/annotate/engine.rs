//! Annotation Engine
//!
//! The facade callers interact with. Owns the scanner, resolver, classifier,
//! result cache, and scheduler; checks the cache before scheduling; and
//! enforces the one-running-task-per-surface invariant by cancelling a
//! surface's previous task whenever a new request arrives for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::jobs::{
    AnnotationScheduler, SchedulerConfig, TaskEvent, TaskHandle,
};
use crate::core::settings::SettingsSource;
use crate::core::store::{EmoticonStore, LinkRecordStore};
use crate::core::surface::RenderSurface;
use crate::core::{CoreResult, Fingerprint, SurfaceId, TaskId};

use super::cache::{AnnotationCache, ANNOTATION_CACHE_CAPACITY};
use super::emoticon::{EmoticonResolver, ImageScaler, EMOTICON_CACHE_CAPACITY};
use super::links::LinkClassifier;
use super::models::AnnotatedText;
use super::scanner::TokenScanner;
use super::task::AnnotationTask;

// =============================================================================
// Configuration
// =============================================================================

/// Engine configuration
#[derive(Clone, Debug)]
pub struct AnnotatorConfig {
    /// Scheme prefixed onto external link targets in internal-link mode
    pub internal_scheme: String,
    /// Bound on cached annotation results
    pub annotation_cache_capacity: usize,
    /// Bound on cached decoded emoticon images
    pub emoticon_cache_capacity: usize,
    /// Worker pool configuration
    pub scheduler: SchedulerConfig,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            internal_scheme: "inapp://".to_string(),
            annotation_cache_capacity: ANNOTATION_CACHE_CAPACITY,
            emoticon_cache_capacity: EMOTICON_CACHE_CAPACITY,
            scheduler: SchedulerConfig::default(),
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// What `annotate` did with a request
#[derive(Clone, Debug)]
pub enum AnnotateOutcome {
    /// Result was resident in the cache and is returned synchronously
    Cached(Arc<AnnotatedText>),
    /// A background task was scheduled; the result arrives via
    /// [`RenderSurface::deliver`]
    Scheduled(TaskId),
    /// Nothing to annotate (empty text)
    Plain,
}

// =============================================================================
// Annotator
// =============================================================================

/// Asynchronous annotation engine.
///
/// Construct once, [`start`](Self::start) inside a tokio runtime, then call
/// [`annotate`](Self::annotate) per render. All components are shared
/// internally by `Arc`, so the engine itself can be wrapped in an `Arc` and
/// used from any thread.
pub struct Annotator {
    scanner: Arc<TokenScanner>,
    resolver: Arc<EmoticonResolver>,
    classifier: Arc<LinkClassifier>,
    cache: Arc<AnnotationCache>,
    settings: Arc<dyn SettingsSource>,
    scheduler: AnnotationScheduler,
    /// Most recent task handle per surface
    active: Mutex<HashMap<SurfaceId, TaskHandle>>,
}

impl Annotator {
    /// Creates an engine over the given collaborators.
    pub fn new(
        emoticon_store: Arc<dyn EmoticonStore>,
        link_store: Arc<dyn LinkRecordStore>,
        scaler: Arc<dyn ImageScaler>,
        settings: Arc<dyn SettingsSource>,
        config: AnnotatorConfig,
    ) -> Self {
        Self {
            scanner: Arc::new(TokenScanner::new()),
            resolver: Arc::new(EmoticonResolver::with_capacity(
                emoticon_store,
                scaler,
                config.emoticon_cache_capacity,
            )),
            classifier: Arc::new(LinkClassifier::new(link_store, config.internal_scheme)),
            cache: Arc::new(AnnotationCache::with_capacity(
                config.annotation_cache_capacity,
            )),
            settings,
            scheduler: AnnotationScheduler::new(config.scheduler),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Spawns the worker pool. Must be called inside a tokio runtime.
    pub fn start(&self) -> Vec<tokio::task::JoinHandle<()>> {
        self.scheduler.start()
    }

    /// Requests annotation of `text` for `surface`.
    ///
    /// Cache hits return synchronously. Misses cancel the surface's previous
    /// task (if still running) and schedule a new one; the finished result
    /// arrives through [`RenderSurface::deliver`]. On
    /// [`CoreError::AdmissionRejected`](crate::core::CoreError) the caller
    /// should fall back to displaying the raw text.
    pub fn annotate(
        &self,
        surface: &Arc<dyn RenderSurface>,
        text: &str,
    ) -> CoreResult<AnnotateOutcome> {
        if text.is_empty() {
            return Ok(AnnotateOutcome::Plain);
        }

        let fingerprint = Fingerprint::of(text);
        if let Some(hit) = self.cache.get(&fingerprint) {
            debug!("annotation cache hit for {}", fingerprint);
            return Ok(AnnotateOutcome::Cached(hit));
        }

        let task = AnnotationTask::new(
            text,
            Arc::downgrade(surface),
            Arc::clone(&self.scanner),
            Arc::clone(&self.resolver),
            Arc::clone(&self.classifier),
            Arc::clone(&self.cache),
            Arc::clone(&self.settings),
        );
        let handle = task.handle();
        let surface_id = surface.surface_id();

        // One running task per surface: the previous one is cancelled before
        // the replacement is admitted.
        if let Some(previous) = self
            .active
            .lock()
            .unwrap()
            .insert(surface_id, handle.clone())
        {
            debug!(
                "cancelling task {} superseded on surface {}",
                previous.id, surface_id
            );
            previous.cancel();
        }

        match self.scheduler.submit(task) {
            Ok(task_id) => Ok(AnnotateOutcome::Scheduled(task_id)),
            Err(e) => {
                let mut active = self.active.lock().unwrap();
                if active.get(&surface_id).is_some_and(|h| h.id == handle.id) {
                    active.remove(&surface_id);
                }
                Err(e)
            }
        }
    }

    /// Cancels the running task for a surface, if any. Call on teardown.
    pub fn cancel_for(&self, surface_id: SurfaceId) {
        if let Some(handle) = self.active.lock().unwrap().remove(&surface_id) {
            handle.cancel();
        }
    }

    /// Evicts both caches. Useful when the environment changes in a way that
    /// alters produced targets, e.g. flipping the internal-link scheme.
    pub fn invalidate_all(&self) {
        info!("evicting annotation and emoticon caches");
        self.cache.evict_all();
        self.resolver.evict_all();
    }

    /// Stops accepting requests and signals workers to exit.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    /// Takes the task event receiver (can only be called once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<TaskEvent>> {
        self.scheduler.take_event_receiver()
    }

    /// The token scanner (its invocation counter doubles as a cache metric)
    pub fn scanner(&self) -> &TokenScanner {
        &self.scanner
    }

    /// The annotation result cache
    pub fn cache(&self) -> &AnnotationCache {
        &self.cache
    }

    /// The emoticon resolver
    pub fn resolver(&self) -> &EmoticonResolver {
        &self.resolver
    }
}
