//! Photo to event extraction pipeline.

use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use suffcal_adapters::{CompletionModel, GenerationOptions, TextRecognizer};
use suffcal_models::Event;

use crate::dates::{resolve_date, RawDate};
use crate::error::{ExtractError, Result};
use crate::prompt::{
    build_user_prompt, KEY_DATE, KEY_LOCATION, KEY_TIME, KEY_TITLE, SYSTEM_PROMPT,
};
use crate::recovery::recover_json;

/// Source of "now" for date defaults.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Turns photos into calendar events using OCR and a language model.
///
/// # Example
///
/// ```ignore
/// let extractor = Extractor::new(Arc::new(TesseractOcr::new("deu")?), Arc::new(model));
/// for event in extractor.extract(Path::new("venue_42.jpg")).await? {
///     println!("{}", event);
/// }
/// ```
#[derive(Clone)]
pub struct Extractor {
    recognizer: Arc<dyn TextRecognizer>,
    model: Arc<dyn CompletionModel>,
    options: GenerationOptions,
    clock: Clock,
}

impl Extractor {
    /// Creates an extractor with default generation options and the local
    /// wall clock.
    pub fn new(recognizer: Arc<dyn TextRecognizer>, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            recognizer,
            model,
            options: GenerationOptions::default(),
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Overrides the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Extracts the events shown on a photo.
    ///
    /// Always returns at least one event. Model output that cannot be
    /// parsed yields a single event carrying only the recognized text.
    ///
    /// # Errors
    /// Fails if OCR fails or finds no text, or if the model cannot be
    /// reached.
    pub async fn extract(&self, image: &Path) -> Result<Vec<Event>> {
        let text = self.recognize_text(image).await?;
        let completion = self.ask_model(image, &text).await?;
        let events = self.events_from_completion(image, &text, &completion);

        info!(
            photo = %image.display(),
            events = events.len(),
            "extracted events"
        );
        Ok(events)
    }

    /// Runs OCR and joins the fragments into one text.
    pub async fn recognize_text(&self, image: &Path) -> Result<String> {
        let fragments = self
            .recognizer
            .recognize(image)
            .await
            .map_err(|source| ExtractError::Recognition {
                path: image.to_path_buf(),
                source,
            })?;

        let text = fragments
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            return Err(ExtractError::NoText(image.to_path_buf()));
        }
        debug!(photo = %image.display(), chars = text.len(), "recognized text");
        Ok(text)
    }

    async fn ask_model(&self, image: &Path, text: &str) -> Result<String> {
        self.model
            .complete(SYSTEM_PROMPT, &build_user_prompt(text), &self.options)
            .await
            .map_err(|source| ExtractError::Model {
                path: image.to_path_buf(),
                source,
            })
    }

    /// Turns a model completion into events.
    ///
    /// An object yields one event, a list yields one event per object in
    /// it. Anything else degrades to a single text-only event.
    pub fn events_from_completion(&self, image: &Path, text: &str, completion: &str) -> Vec<Event> {
        let now = (self.clock)();

        let value = match recover_json(completion) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    photo = %image.display(),
                    text = %text,
                    completion = %e.raw,
                    "unable to parse model response"
                );
                return vec![Event::degraded(image, text, now)];
            }
        };

        let events: Vec<Event> = match value {
            Value::Object(fields) => vec![event_from_fields(image, text, &fields, now)],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(fields) => Some(event_from_fields(image, text, fields, now)),
                    other => {
                        debug!(photo = %image.display(), item = %other, "ignoring non-object item");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        if events.is_empty() {
            warn!(
                photo = %image.display(),
                completion = %completion,
                "model response holds no events"
            );
            return vec![Event::degraded(image, text, now)];
        }
        events
    }
}

fn event_from_fields(image: &Path, text: &str, fields: &Map<String, Value>, now: NaiveDateTime) -> Event {
    let date = resolve_date(&RawDate::from_json(field(fields, KEY_DATE, "date")), now);

    let mut event = Event::new(image, text, date);
    event.title = string_field(fields, KEY_TITLE, "title");
    event.time = string_field(fields, KEY_TIME, "time");
    event.location = string_field(fields, KEY_LOCATION, "location");
    event
}

/// Looks up a key in the prompt language, then its English alias.
fn field<'a>(fields: &'a Map<String, Value>, key: &str, alias: &str) -> Option<&'a Value> {
    fields
        .get(key)
        .filter(|v| !v.is_null())
        .or_else(|| fields.get(alias))
}

fn string_field(fields: &Map<String, Value>, key: &str, alias: &str) -> Option<String> {
    match field(fields, key, alias)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
