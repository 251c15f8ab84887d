//! Error types for the runtime crate.

use thiserror::Error;

/// Errors that can occur in the tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Photo store error.
    #[error("storage error: {0}")]
    Persistence(#[from] suffcal_persistence::PersistenceError),

    /// Media network error.
    #[error("media source error: {0}")]
    Source(#[from] suffcal_adapters::AdapterError),

    /// A tracker already exists in this process.
    #[error("photo tracker already initialized")]
    AlreadyInitialized,

    /// No tracker was created yet.
    #[error("photo tracker not initialized")]
    NotInitialized,

    /// Background acquisition is already running.
    #[error("background acquisition already running")]
    AlreadyRunning,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
