//! Annotation Job System
//!
//! Task lifecycle types and the bounded worker pool that runs annotation
//! tasks off the interactive thread.

mod worker;

pub use worker::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::TaskId;

// =============================================================================
// Task States
// =============================================================================

/// Annotation task state machine.
///
/// `Pending -> Running -> {Completed, Cancelled, TargetGone}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    /// Created, not yet picked up by a worker
    #[default]
    Pending,
    /// Scanning and resolving spans
    Running,
    /// Result built, cached, and delivered
    Completed,
    /// Cancellation requested before completion; nothing published
    Cancelled,
    /// Consumer vanished before delivery; result cached but not delivered
    TargetGone,
}

impl TaskState {
    /// Checks if the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Cancelled | TaskState::TargetGone
        )
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation flag shared between a task and its handle.
///
/// Tasks poll it at each span boundary; setting it never interrupts an
/// in-progress decode, only skips the remaining work.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle to a submitted task for cancellation
#[derive(Clone, Debug)]
pub struct TaskHandle {
    /// Task ID
    pub id: TaskId,
    cancel: CancelFlag,
}

impl TaskHandle {
    /// Creates a handle sharing the task's cancellation flag
    pub fn new(id: TaskId, cancel: CancelFlag) -> Self {
        Self { id, cancel }
    }

    /// Requests cancellation of the task
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// =============================================================================
// Task Events
// =============================================================================

/// Task lifecycle event published by the scheduler
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskEvent {
    /// A worker picked the task up
    Started { task_id: TaskId },
    /// The task reached a terminal state
    Finished { task_id: TaskId, state: TaskState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_terminal_checks() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(TaskState::TargetGone.is_terminal());
    }

    #[test]
    fn test_cancel_flag_is_shared_with_handle() {
        let flag = CancelFlag::new();
        let handle = TaskHandle::new("task_001".to_string(), flag.clone());

        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
        assert!(handle.is_cancelled());
    }
}
