//! Error types for the application.

use thiserror::Error;

/// Errors that stop the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required setting is missing.
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    /// Collaborator setup or call failed.
    #[error(transparent)]
    Adapter(#[from] suffcal_adapters::AdapterError),

    /// Tracker error.
    #[error(transparent)]
    Tracker(#[from] suffcal_runtime::TrackerError),

    /// Photo store error.
    #[error(transparent)]
    Persistence(#[from] suffcal_persistence::PersistenceError),

    /// Extraction error.
    #[error(transparent)]
    Extract(#[from] suffcal_extract::ExtractError),

    /// Output could not be written.
    #[error("failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Signal handling failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
