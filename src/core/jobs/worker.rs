//! Worker Pool Module
//!
//! Bounded pool of long-lived workers executing annotation tasks. A small
//! set of always-warm core workers drains a bounded admission queue; when the
//! queue is full, submissions burst extra short-lived workers up to a hard
//! ceiling, and beyond that they fail loudly with `AdmissionRejected` so the
//! caller can fall back to unannotated text.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::core::annotate::AnnotationTask;
use crate::core::{CoreError, CoreResult, TaskId};

use super::TaskEvent;

// =============================================================================
// Scheduler Configuration
// =============================================================================

/// Worker pool configuration
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Always-warm workers
    pub core_workers: usize,
    /// Hard ceiling on live workers under burst
    pub max_workers: usize,
    /// Admission queue capacity
    pub queue_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            core_workers: 5,
            max_workers: 128,
            queue_capacity: 10,
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

struct SchedulerInner {
    config: SchedulerConfig,
    queue: Mutex<VecDeque<AnnotationTask>>,
    /// Live workers, core and burst combined
    workers: AtomicUsize,
    work_ready: Notify,
    shutdown: Notify,
    shutting_down: AtomicBool,
    started: AtomicBool,
    event_tx: mpsc::UnboundedSender<TaskEvent>,
}

/// Bounded worker pool running annotation tasks.
pub struct AnnotationScheduler {
    inner: Arc<SchedulerInner>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<TaskEvent>>>,
}

impl AnnotationScheduler {
    /// Creates a scheduler (workers are spawned by [`start`](Self::start)).
    pub fn new(config: SchedulerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(SchedulerInner {
                config,
                queue: Mutex::new(VecDeque::new()),
                workers: AtomicUsize::new(0),
                work_ready: Notify::new(),
                shutdown: Notify::new(),
                shutting_down: AtomicBool::new(false),
                started: AtomicBool::new(false),
                event_tx,
            }),
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    /// Creates a scheduler with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SchedulerConfig::default())
    }

    /// Spawns the core workers. Must be called inside a tokio runtime;
    /// calling it more than once is a no-op.
    ///
    /// # Returns
    /// Task handles for the spawned workers.
    pub fn start(&self) -> Vec<tokio::task::JoinHandle<()>> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }

        let mut handles = Vec::with_capacity(self.inner.config.core_workers);
        for worker_id in 0..self.inner.config.core_workers {
            self.inner.workers.fetch_add(1, Ordering::SeqCst);
            handles.push(tokio::spawn(run_core_worker(
                Arc::clone(&self.inner),
                worker_id,
            )));
        }
        handles
    }

    /// Submits a task for execution.
    ///
    /// Admission order: enqueue while the queue has room, otherwise burst a
    /// new worker seeded with the task while under the worker ceiling,
    /// otherwise reject.
    pub fn submit(&self, task: AnnotationTask) -> CoreResult<TaskId> {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            return Err(CoreError::SchedulerShutdown);
        }

        let task_id = task.id().clone();

        {
            let mut queue = self.inner.queue.lock().unwrap();
            if queue.len() < self.inner.config.queue_capacity {
                queue.push_back(task);
                drop(queue);
                self.inner.work_ready.notify_one();
                return Ok(task_id);
            }
        }

        // Queue full: burst an extra worker if the ceiling allows.
        let admitted = self
            .inner
            .workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live < self.inner.config.max_workers).then_some(live + 1)
            });

        match admitted {
            Ok(_) => {
                debug!("queue full, bursting worker for task {}", task_id);
                tokio::spawn(run_burst_worker(Arc::clone(&self.inner), task));
                Ok(task_id)
            }
            Err(live) => {
                warn!(
                    "annotation submission rejected: queue at {} and {} workers live",
                    self.inner.config.queue_capacity, live
                );
                Err(CoreError::AdmissionRejected(format!(
                    "queue at capacity {} with {} workers live",
                    self.inner.config.queue_capacity, live
                )))
            }
        }
    }

    /// Current admission queue length
    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().unwrap().len()
    }

    /// Number of live workers (core and burst)
    pub fn worker_count(&self) -> usize {
        self.inner.workers.load(Ordering::SeqCst)
    }

    /// Takes the event receiver (can only be called once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<TaskEvent>> {
        self.event_rx.lock().unwrap().take()
    }

    /// Stops accepting submissions and signals workers to exit. Tasks still
    /// queued are dropped; a task already running finishes its run first.
    pub fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        self.inner.shutdown.notify_waiters();
    }
}

// =============================================================================
// Worker Runners
// =============================================================================

fn pop_task(inner: &SchedulerInner) -> Option<AnnotationTask> {
    inner.queue.lock().unwrap().pop_front()
}

async fn run_task(inner: &SchedulerInner, task: AnnotationTask) {
    let task_id = task.id().clone();
    let _ = inner.event_tx.send(TaskEvent::Started {
        task_id: task_id.clone(),
    });

    let state = task.run().await;
    debug!("annotation task {} finished: {:?}", task_id, state);

    let _ = inner.event_tx.send(TaskEvent::Finished { task_id, state });
}

/// How long an idle worker sleeps before re-checking the queue and shutdown
/// flag. A notification racing the park is healed by the next tick.
const WORKER_IDLE_TICK: std::time::Duration = std::time::Duration::from_millis(100);

/// Long-lived core worker: drains the queue, then parks until woken.
async fn run_core_worker(inner: Arc<SchedulerInner>, worker_id: usize) {
    info!("annotation worker {} started", worker_id);

    loop {
        while let Some(task) = pop_task(&inner) {
            run_task(&inner, task).await;
        }

        if inner.shutting_down.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            _ = inner.shutdown.notified() => {}
            _ = inner.work_ready.notified() => {}
            _ = tokio::time::sleep(WORKER_IDLE_TICK) => {}
        }
    }

    info!("annotation worker {} shutting down", worker_id);
    inner.workers.fetch_sub(1, Ordering::SeqCst);
}

/// Burst worker: runs its seed task, helps drain the queue, then retires.
async fn run_burst_worker(inner: Arc<SchedulerInner>, seed: AnnotationTask) {
    run_task(&inner, seed).await;

    while !inner.shutting_down.load(Ordering::SeqCst) {
        match pop_task(&inner) {
            Some(task) => run_task(&inner, task).await,
            None => break,
        }
    }

    debug!("burst worker retired");
    inner.workers.fetch_sub(1, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use super::*;
    use crate::core::annotate::models::DecodedImage;
    use crate::core::annotate::{
        AnnotatedText, AnnotationCache, EmoticonResolver, ImageScaler, LinkClassifier,
        TokenScanner,
    };
    use crate::core::jobs::TaskState;
    use crate::core::settings::{AnnotationSettings, SettingsSource};
    use crate::core::store::{MemoryEmoticonStore, MemoryLinkRecordStore};
    use crate::core::surface::{next_surface_id, RenderSurface};
    use crate::core::SurfaceId;

    struct FakeSurface {
        id: SurfaceId,
        line_height: AtomicU32,
        delivered: Mutex<Vec<Arc<AnnotatedText>>>,
    }

    impl FakeSurface {
        fn new(line_height: u32) -> Arc<Self> {
            Arc::new(Self {
                id: next_surface_id(),
                line_height: AtomicU32::new(line_height),
                delivered: Mutex::new(Vec::new()),
            })
        }
    }

    impl RenderSurface for FakeSurface {
        fn surface_id(&self) -> SurfaceId {
            self.id
        }

        fn line_height(&self) -> u32 {
            self.line_height.load(Ordering::SeqCst)
        }

        fn deliver(&self, text: Arc<AnnotatedText>) {
            self.delivered.lock().unwrap().push(text);
        }
    }

    struct FixedScaler;

    impl ImageScaler for FixedScaler {
        fn decode_scaled(&self, _bytes: &[u8], target_px: u32) -> crate::core::CoreResult<DecodedImage> {
            Ok(DecodedImage::new(target_px, target_px, vec![0; 4]))
        }
    }

    fn test_task(text: &str, surface: &Arc<FakeSurface>) -> AnnotationTask {
        let surface: Arc<dyn RenderSurface> = Arc::clone(surface) as Arc<dyn RenderSurface>;
        AnnotationTask::new(
            text,
            Arc::downgrade(&surface),
            Arc::new(TokenScanner::new()),
            Arc::new(EmoticonResolver::new(
                Arc::new(MemoryEmoticonStore::new()),
                Arc::new(FixedScaler),
            )),
            Arc::new(LinkClassifier::new(
                Arc::new(MemoryLinkRecordStore::new()),
                "inapp://",
            )),
            Arc::new(AnnotationCache::new()),
            Arc::new(AnnotationSettings::new(false)) as Arc<dyn SettingsSource>,
        )
    }

    async fn wait_for_finished(
        rx: &mut mpsc::UnboundedReceiver<TaskEvent>,
        count: usize,
    ) -> Vec<(TaskId, TaskState)> {
        let mut finished = Vec::new();
        while finished.len() < count {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for task events")
                .expect("event channel closed");
            if let TaskEvent::Finished { task_id, state } = event {
                finished.push((task_id, state));
            }
        }
        finished
    }

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.core_workers, 5);
        assert_eq!(config.max_workers, 128);
        assert_eq!(config.queue_capacity, 10);
    }

    #[test]
    fn test_submit_enqueues() {
        let scheduler = AnnotationScheduler::with_defaults();
        let surface = FakeSurface::new(32);

        scheduler.submit(test_task("hi @bob", &surface)).unwrap();
        assert_eq!(scheduler.queue_len(), 1);
    }

    #[test]
    fn test_admission_rejected_when_saturated() {
        // No workers allowed at all: the queue is the only capacity.
        let scheduler = AnnotationScheduler::new(SchedulerConfig {
            core_workers: 0,
            max_workers: 0,
            queue_capacity: 2,
        });
        let surface = FakeSurface::new(32);

        scheduler.submit(test_task("one", &surface)).unwrap();
        scheduler.submit(test_task("two", &surface)).unwrap();
        let err = scheduler.submit(test_task("three", &surface)).unwrap_err();

        assert!(matches!(err, CoreError::AdmissionRejected(_)));
        assert_eq!(scheduler.queue_len(), 2);
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let scheduler = AnnotationScheduler::with_defaults();
        scheduler.shutdown();

        let surface = FakeSurface::new(32);
        let err = scheduler.submit(test_task("hi", &surface)).unwrap_err();
        assert!(matches!(err, CoreError::SchedulerShutdown));
    }

    #[tokio::test]
    async fn test_workers_drain_queue() {
        let scheduler = AnnotationScheduler::new(SchedulerConfig {
            core_workers: 2,
            max_workers: 4,
            queue_capacity: 10,
        });
        let mut rx = scheduler.take_event_receiver().unwrap();
        scheduler.start();

        let surface = FakeSurface::new(32);
        let id_a = scheduler.submit(test_task("hi @bob", &surface)).unwrap();
        let id_b = scheduler.submit(test_task("yo @eve", &surface)).unwrap();

        let finished = wait_for_finished(&mut rx, 2).await;
        let ids: Vec<_> = finished.iter().map(|(id, _)| id.clone()).collect();
        assert!(ids.contains(&id_a));
        assert!(ids.contains(&id_b));
        assert!(finished.iter().all(|(_, s)| *s == TaskState::Completed));
        assert_eq!(scheduler.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_burst_worker_runs_overflow_task() {
        // No core workers: the first task parks in the queue, the second
        // overflows it and bursts a worker that then drains both.
        let scheduler = AnnotationScheduler::new(SchedulerConfig {
            core_workers: 0,
            max_workers: 2,
            queue_capacity: 1,
        });
        let mut rx = scheduler.take_event_receiver().unwrap();
        scheduler.start();

        let surface = FakeSurface::new(32);
        scheduler.submit(test_task("first", &surface)).unwrap();
        scheduler.submit(test_task("second", &surface)).unwrap();

        let finished = wait_for_finished(&mut rx, 2).await;
        assert!(finished.iter().all(|(_, s)| *s == TaskState::Completed));
        assert_eq!(surface.delivered.lock().unwrap().len(), 2);
    }
}
