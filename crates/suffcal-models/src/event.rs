//! Calendar events extracted from photo text.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Resolution state of an event's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventDate {
    /// A date read from the source text.
    Resolved(NaiveDateTime),
    /// No date was supplied; carries the extraction time as a sentinel.
    Defaulted(NaiveDateTime),
    /// A date was supplied but could not be understood.
    Unresolved,
}

impl EventDate {
    /// Returns the date only if it was read from the source text.
    pub fn resolved(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Resolved(date) => Some(*date),
            _ => None,
        }
    }

    /// Returns the date value, including the sentinel.
    pub fn value(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Resolved(date) | Self::Defaulted(date) => Some(*date),
            Self::Unresolved => None,
        }
    }

    /// Returns true if the date came from the source text.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M")),
            Self::Defaulted(date) => write!(f, "{} (default)", date.format("%Y-%m-%d %H:%M")),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// One calendar entry extracted from a photo.
///
/// Events are transient: nothing records which events were emitted, so a
/// photo must be processed at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Photo the event was read from.
    pub source: PathBuf,

    /// Recognized text of the photo.
    pub original_text: String,

    /// Event title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Time of day as written in the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Venue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Event date.
    pub date: EventDate,
}

impl Event {
    /// Creates an event with no structured fields.
    pub fn new(source: impl Into<PathBuf>, original_text: impl Into<String>, date: EventDate) -> Self {
        Self {
            source: source.into(),
            original_text: original_text.into(),
            title: None,
            time: None,
            location: None,
            date,
        }
    }

    /// Creates the fallback event used when structured extraction failed.
    pub fn degraded(
        source: impl Into<PathBuf>,
        original_text: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self::new(source, original_text, EventDate::Defaulted(now))
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the time of day.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns true if no structured data was extracted at all.
    pub fn is_degraded(&self) -> bool {
        self.title.is_none()
            && self.time.is_none()
            && self.location.is_none()
            && !self.date.is_resolved()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {}",
            self.title.as_deref().unwrap_or("<untitled>"),
            self.date
        )?;
        if let Some(ref time) = self.time {
            write!(f, " at {}", time)?;
        }
        if let Some(ref location) = self.location {
            write!(f, " in {}", location)?;
        }
        write!(f, " [{}]", self.source.display())
    }
}
