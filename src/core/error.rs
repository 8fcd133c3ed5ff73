//! Annotext Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Task Outcomes
    // =========================================================================
    #[error("annotation task cancelled")]
    Cancelled,

    #[error("render surface no longer alive")]
    SurfaceGone,

    // =========================================================================
    // Scheduling Errors
    // =========================================================================
    #[error("annotation queue full: {0}")]
    AdmissionRejected(String),

    #[error("scheduler is shut down")]
    SchedulerShutdown,

    // =========================================================================
    // Span Resolution Errors
    // =========================================================================
    #[error("image decode failed: {0}")]
    DecodeFailed(String),

    #[error("store lookup failed: {0}")]
    StoreFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
