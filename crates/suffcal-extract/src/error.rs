//! Error types for the extraction pipeline.

use std::path::PathBuf;
use thiserror::Error;

use suffcal_adapters::AdapterError;

/// Errors that abort extraction for one photo.
///
/// Malformed model output is not an error; it degrades to a text-only event.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The OCR collaborator failed.
    #[error("text recognition failed for {path}: {source}")]
    Recognition {
        path: PathBuf,
        #[source]
        source: AdapterError,
    },

    /// The OCR collaborator found no text.
    #[error("no text recognized in {0}")]
    NoText(PathBuf),

    /// The language model could not be invoked.
    #[error("model invocation failed for {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: AdapterError,
    },
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractError::NoText(PathBuf::from("a_1.jpg"));
        assert_eq!(err.to_string(), "no text recognized in a_1.jpg");

        let err = ExtractError::Model {
            path: PathBuf::from("a_1.jpg"),
            source: AdapterError::NotLoggedIn,
        };
        assert_eq!(err.to_string(), "model invocation failed for a_1.jpg: not logged in");
    }
}
