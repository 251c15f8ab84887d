//! Collaborator adapters for Suffcal.
//!
//! Suffcal talks to four external systems, each behind a trait in
//! [`traits`]:
//!
//! - **MediaSource**: lists and downloads posts of the tracked account
//! - **TextRecognizer**: turns an image into recognized text fragments
//! - **CompletionModel**: turns a prompt into a free-text completion
//! - **CalendarSink**: stores an event in a remote calendar
//!
//! Concrete implementations live next to the traits:
//!
//! - [`MediaBridgeClient`]: HTTP bridge in front of the media network
//! - [`TesseractOcr`]: the `tesseract` command line tool
//! - [`ChatCompletionClient`]: any OpenAI-compatible chat completions endpoint
//! - [`CalDavCalendar`]: a CalDAV calendar collection
//!
//! # Example
//!
//! ```ignore
//! use suffcal_adapters::{chat, ChatCompletionClient, CompletionModel, GenerationOptions};
//!
//! let model = ChatCompletionClient::new(chat::OPENROUTER_API_URL, chat::DEFAULT_MODEL)
//!     .with_api_key(std::env::var("LLM_API_KEY")?);
//! let reply = model
//!     .complete("You extract events.", "Text: ...", &GenerationOptions::default())
//!     .await?;
//! ```

pub mod bridge;
pub mod caldav;
pub mod chat;
pub mod error;
pub mod tesseract;
pub mod traits;

pub use bridge::MediaBridgeClient;
pub use caldav::CalDavCalendar;
pub use chat::ChatCompletionClient;
pub use error::{AdapterError, Result};
pub use tesseract::TesseractOcr;
pub use traits::{
    CalendarEntry, CalendarSink, CompletionModel, GenerationOptions, MediaSource, TextRecognizer,
};
