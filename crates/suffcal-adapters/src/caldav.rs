//! CalDAV calendar sink.
//!
//! Each entry becomes one `VEVENT` resource PUT into the configured
//! calendar collection under a fresh UID.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use icalendar::{Calendar, Component, Event as IcsEvent};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::error::{AdapterError, Result};
use crate::traits::{CalendarEntry, CalendarSink};

/// Calendar collection reached over CalDAV with basic auth.
pub struct CalDavCalendar {
    client: reqwest::Client,
    collection: Url,
    user: String,
    password: String,
}

impl CalDavCalendar {
    /// Create a sink for the collection at `collection_url`.
    pub fn new(
        collection_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let collection = if collection_url.ends_with('/') {
            Url::parse(collection_url)?
        } else {
            Url::parse(&format!("{}/", collection_url))?
        };

        Ok(Self {
            client: reqwest::Client::new(),
            collection,
            user: user.into(),
            password: password.into(),
        })
    }

    /// Returns the collection URL.
    pub fn collection(&self) -> &Url {
        &self.collection
    }
}

#[async_trait]
impl CalendarSink for CalDavCalendar {
    async fn add_event(&self, entry: &CalendarEntry) -> Result<()> {
        let uid = Uuid::new_v4().to_string();
        let url = self.collection.join(&format!("{}.ics", uid))?;
        let body = to_ics(&uid, entry);

        debug!(url = %url, "putting calendar resource");

        let response = self
            .client
            .put(url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Content-Type", "text/calendar; charset=utf-8")
            .header("If-None-Match", "*")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                service: "caldav",
                status: status.as_u16(),
                body,
            });
        }

        info!(
            title = entry.title.as_deref().unwrap_or_default(),
            start = %entry.start,
            "added calendar event"
        );
        Ok(())
    }
}

fn format_local(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Renders an entry as an iCalendar document with floating local times.
fn to_ics(uid: &str, entry: &CalendarEntry) -> String {
    let mut event = IcsEvent::new();
    event.uid(uid);
    if let Some(ref title) = entry.title {
        event.summary(title);
    }
    event.description(&entry.description);
    if let Some(ref location) = entry.location {
        event.add_property("LOCATION", location);
    }
    event.add_property("DTSTART", &format_local(&entry.start));
    event.add_property("DTEND", &format_local(&entry.end));
    event.timestamp(Utc::now());

    let mut calendar = Calendar::new();
    calendar.push(event);
    calendar.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry() -> CalendarEntry {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        CalendarEntry {
            title: Some("Konzert".into()),
            start,
            end: start,
            description: "Original text: Konzert".into(),
            location: Some("Stadtpark".into()),
        }
    }

    #[test]
    fn test_to_ics() {
        let ics = to_ics("abc-123", &entry());

        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("UID:abc-123"));
        assert!(ics.contains("SUMMARY:Konzert"));
        assert!(ics.contains("LOCATION:Stadtpark"));
        assert!(ics.contains("DTSTART:20240501T193000"));
        assert!(ics.contains("DTEND:20240501T193000"));
    }

    #[test]
    fn test_to_ics_without_title() {
        let mut entry = entry();
        entry.title = None;
        entry.location = None;
        let ics = to_ics("abc-123", &entry);

        assert!(!ics.contains("SUMMARY"));
        assert!(!ics.contains("LOCATION"));
    }

    #[test]
    fn test_collection_url_normalized() {
        let sink = CalDavCalendar::new("https://dav.example.org/cal/feste", "u", "p").unwrap();
        assert_eq!(sink.collection().as_str(), "https://dav.example.org/cal/feste/");
    }
}
