//! Text recognition through the `tesseract` command line tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{AdapterError, Result};
use crate::traits::TextRecognizer;

/// Default recognition language (German).
pub const DEFAULT_LANGUAGE: &str = "deu";

/// OCR engine backed by a local `tesseract` install.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    /// Path to tesseract binary.
    binary: PathBuf,
    /// Tesseract language code(s), e.g. `deu` or `deu+eng`.
    language: String,
}

impl TesseractOcr {
    /// Create a recognizer for the given language.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::ToolMissing` if tesseract is not in PATH.
    pub fn new(language: impl Into<String>) -> Result<Self> {
        let binary =
            which::which("tesseract").map_err(|_| AdapterError::ToolMissing("tesseract".into()))?;
        debug!(path = %binary.display(), "tesseract found");
        Ok(Self {
            binary,
            language: normalize_language(&language.into()),
        })
    }

    /// Returns the configured language.
    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl TextRecognizer for TesseractOcr {
    async fn recognize(&self, image: &Path) -> Result<Vec<String>> {
        trace!(image = %image.display(), lang = %self.language, "running tesseract");

        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|source| AdapterError::Io {
                path: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AdapterError::Recognition {
                path: image.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(split_fragments(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Maps two-letter codes to tesseract's three-letter language names.
fn normalize_language(language: &str) -> String {
    match language {
        "de" => "deu".to_string(),
        "en" => "eng".to_string(),
        "fr" => "fra".to_string(),
        "it" => "ita".to_string(),
        "es" => "spa".to_string(),
        other => other.to_string(),
    }
}

/// Splits tesseract output into non-empty trimmed lines.
fn split_fragments(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fragments() {
        let out = "SOMMERFEST\n\n  12. Juli  \n\x0c";
        assert_eq!(split_fragments(out), vec!["SOMMERFEST", "12. Juli"]);
    }

    #[test]
    fn test_split_fragments_empty() {
        assert!(split_fragments("\n \n").is_empty());
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("de"), "deu");
        assert_eq!(normalize_language("deu+eng"), "deu+eng");
    }
}
