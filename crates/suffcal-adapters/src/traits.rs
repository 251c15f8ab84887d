//! Core traits for external collaborators.
//!
//! Suffcal owns none of the systems it talks to. Each of them is reached
//! through one of the traits below so the tracker and the extraction
//! pipeline can be driven by in-memory fakes in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use suffcal_models::{PhotoId, Post};

use crate::error::Result;

/// The media network hosting the tracked account.
///
/// # Example
///
/// ```ignore
/// use suffcal_adapters::MediaSource;
///
/// async fn newest(source: &dyn MediaSource) -> suffcal_adapters::Result<()> {
///     source.login("me", "secret").await?;
///     let user_id = source.resolve_user_id("venue").await?;
///     for post in source.list_recent_media(&user_id, 5).await? {
///         println!("{} ({})", post.id, post.media_type);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Opens a session.
    async fn login(&self, user: &str, password: &str) -> Result<()>;

    /// Closes the session opened by `login`.
    async fn logout(&self) -> Result<()>;

    /// Resolves an account handle to the network's user id.
    async fn resolve_user_id(&self, handle: &str) -> Result<String>;

    /// Lists up to `limit` posts of a user, newest first.
    async fn list_recent_media(&self, user_id: &str, limit: usize) -> Result<Vec<Post>>;

    /// Downloads the photo of a post into `destination` and returns the
    /// written file. The file name must end in `_<id>.<ext>`.
    async fn download_photo(&self, post: &PhotoId, destination: &Path) -> Result<PathBuf>;
}

/// Optical character recognition engine.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Returns the text fragments recognized in an image, in reading order.
    async fn recognize(&self, image: &Path) -> Result<Vec<String>>;
}

/// Sampling settings for a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Ask the model to answer with a JSON document.
    pub json_output: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.95,
            max_tokens: 1024,
            json_output: true,
        }
    }
}

impl GenerationOptions {
    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Sets the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Enables or disables the JSON output hint.
    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }
}

/// Language model producing free-text completions.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Completes a system/user prompt pair.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;
}

/// An entry ready to be written to a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Summary line.
    pub title: Option<String>,
    /// Start of the event, local time.
    pub start: NaiveDateTime,
    /// End of the event, local time.
    pub end: NaiveDateTime,
    /// Free-form description.
    pub description: String,
    /// Venue.
    pub location: Option<String>,
}

/// Remote calendar receiving extracted events.
#[async_trait]
pub trait CalendarSink: Send + Sync {
    /// Stores one entry.
    async fn add_event(&self, entry: &CalendarEntry) -> Result<()>;
}
