//! Error types for cache and executor operations

use thiserror::Error;

/// Main error type for all cache and executor operations
///
/// The enum is `Clone` because executor task outcomes are broadcast to
/// every waiter of the same task.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Invalid input (empty key name, non-positive duration, duplicate
    /// task ids, value out of bounds)
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Operation invoked in the wrong lifecycle state
    #[error("invalid state: {0}")]
    State(String),

    /// Task was never submitted to the executor
    #[error("task not found: {0}")]
    NotFound(String),

    /// Task was stopped before it could run
    #[error("task cancelled: {0}")]
    Cancelled(String),

    /// A task's body failed
    #[error("task failed: {0}")]
    Task(String),

    /// Underlying store malfunction
    #[error("backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Shorthand for an [`CacheError::Argument`] error
    pub fn argument(msg: impl Into<String>) -> Self {
        CacheError::Argument(msg.into())
    }

    /// Shorthand for a [`CacheError::State`] error
    pub fn state(msg: impl Into<String>) -> Self {
        CacheError::State(msg.into())
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
