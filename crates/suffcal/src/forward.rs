//! Forwarding extracted events to the calendar.
//!
//! Only events that carry a real date today or later are written; the
//! text-only fallback event and the "now" sentinel never reach the
//! calendar.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use suffcal_adapters::{CalendarEntry, CalendarSink};
use suffcal_extract::{parse_time_of_day, Clock, Extractor};
use suffcal_models::{Event, EventDate, Photo};
use suffcal_runtime::{HandlerError, PhotoHandler};

/// Why an event is not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Nothing structured was extracted.
    Degraded,
    /// The date could not be parsed.
    Unresolved,
    /// No date was given.
    Dateless,
    /// The event is over.
    Past(NaiveDate),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded => write!(f, "no event data extracted"),
            Self::Unresolved => write!(f, "date could not be parsed"),
            Self::Dateless => write!(f, "event got no date"),
            Self::Past(date) => write!(f, "event is in the past ({})", date),
        }
    }
}

/// Builds the calendar entry for an event, or says why there is none.
///
/// Start and end are the event date combined with the time of day when
/// one can be read from the event.
pub fn calendar_entry(event: &Event, today: NaiveDate) -> Result<CalendarEntry, Skip> {
    if event.is_degraded() {
        return Err(Skip::Degraded);
    }

    let date = match event.date {
        EventDate::Resolved(date) => date,
        EventDate::Defaulted(_) => return Err(Skip::Dateless),
        EventDate::Unresolved => return Err(Skip::Unresolved),
    };
    if date.date() < today {
        return Err(Skip::Past(date.date()));
    }

    let start = match event.time.as_deref().and_then(parse_time_of_day) {
        Some(time) => date.date().and_time(time),
        None => date,
    };

    Ok(CalendarEntry {
        title: event.title.clone(),
        start,
        end: start,
        description: format!("Original text: {}", event.original_text),
        location: event.location.clone(),
    })
}

/// Handler extracting the events of a photo and writing them to a calendar.
pub struct CalendarForwarder {
    extractor: Extractor,
    calendar: Arc<dyn CalendarSink>,
    clock: Clock,
}

impl CalendarForwarder {
    /// Creates a forwarder using the local date.
    pub fn new(extractor: Extractor, calendar: Arc<dyn CalendarSink>) -> Self {
        Self {
            extractor,
            calendar,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Overrides the clock deciding what is in the past.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Forwards events, returning how many were written.
    pub async fn forward(&self, events: &[Event]) -> Result<usize, HandlerError> {
        let today = (self.clock)().date();
        let mut written = 0;
        let mut failed = 0;

        for event in events {
            let entry = match calendar_entry(event, today) {
                Ok(entry) => entry,
                Err(reason) => {
                    info!(
                        photo = %event.source.display(),
                        title = event.title.as_deref().unwrap_or_default(),
                        reason = %reason,
                        "skipping event"
                    );
                    continue;
                }
            };

            match self.calendar.add_event(&entry).await {
                Ok(()) => written += 1,
                Err(e) => {
                    failed += 1;
                    warn!(photo = %event.source.display(), error = %e, "failed to add calendar event");
                }
            }
        }

        if failed > 0 {
            return Err(format!("{} of {} calendar writes failed", failed, failed + written).into());
        }
        Ok(written)
    }
}

#[async_trait]
impl PhotoHandler for CalendarForwarder {
    async fn handle(&self, photo: &Photo) -> Result<(), HandlerError> {
        let events = self.extractor.extract(&photo.path).await?;
        for event in &events {
            info!("{}", event);
        }
        self.forward(&events).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};
    use std::path::Path;
    use std::sync::Mutex;
    use suffcal_adapters::{
        AdapterError, CompletionModel, GenerationOptions, Result as AdapterResult, TextRecognizer,
    };

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    fn event(date: EventDate) -> Event {
        Event::new("venue_1.jpg", "KONZERT 1. Mai 19 Uhr", date).with_title("Konzert")
    }

    #[test]
    fn test_entry_for_future_event() {
        let event = event(EventDate::Resolved(at(2024, 5, 1)))
            .with_time("19:30 Uhr")
            .with_location("Stadtpark");

        let entry = calendar_entry(&event, today()).unwrap();

        let start = at(2024, 5, 1).date().and_time(NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert_eq!(entry.start, start);
        assert_eq!(entry.end, start);
        assert_eq!(entry.title.as_deref(), Some("Konzert"));
        assert_eq!(entry.location.as_deref(), Some("Stadtpark"));
        assert_eq!(entry.description, "Original text: KONZERT 1. Mai 19 Uhr");
    }

    #[test]
    fn test_unreadable_time_keeps_date() {
        let event = event(EventDate::Resolved(at(2024, 5, 1))).with_time("abends");
        assert_eq!(calendar_entry(&event, today()).unwrap().start, at(2024, 5, 1));
    }

    #[test]
    fn test_today_is_not_past() {
        let event = event(EventDate::Resolved(at(2024, 4, 1)));
        assert!(calendar_entry(&event, today()).is_ok());
    }

    #[test]
    fn test_skip_reasons() {
        let past = event(EventDate::Resolved(at(2024, 3, 31)));
        assert_eq!(
            calendar_entry(&past, today()),
            Err(Skip::Past(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()))
        );

        let dateless = event(EventDate::Defaulted(at(2024, 4, 1)));
        assert_eq!(calendar_entry(&dateless, today()), Err(Skip::Dateless));

        let unresolved = event(EventDate::Unresolved);
        assert_eq!(calendar_entry(&unresolved, today()), Err(Skip::Unresolved));

        let degraded = Event::degraded("venue_1.jpg", "Hallo", at(2024, 4, 1));
        assert_eq!(calendar_entry(&degraded, today()), Err(Skip::Degraded));
    }

    struct FakeCalendar {
        entries: Mutex<Vec<CalendarEntry>>,
        fail: bool,
    }

    #[async_trait]
    impl CalendarSink for FakeCalendar {
        async fn add_event(&self, entry: &CalendarEntry) -> AdapterResult<()> {
            if self.fail {
                return Err(AdapterError::Status {
                    service: "caldav",
                    status: 500,
                    body: String::new(),
                });
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct StaticOcr;

    #[async_trait]
    impl TextRecognizer for StaticOcr {
        async fn recognize(&self, _image: &Path) -> AdapterResult<Vec<String>> {
            Ok(vec!["Programm April".into()])
        }
    }

    struct StaticModel;

    #[async_trait]
    impl CompletionModel for StaticModel {
        async fn complete(&self, _: &str, _: &str, _: &GenerationOptions) -> AdapterResult<String> {
            Ok(r#"[{"Titel": "Alt", "Datum": "2024-03-01"},
                   {"Titel": "Neu", "Datum": "2024-04-20", "Uhrzeit": "20 Uhr"},
                   {"Titel": "Irgendwann", "Datum": null}]"#
                .into())
        }
    }

    fn forwarder(fail: bool) -> (CalendarForwarder, Arc<FakeCalendar>) {
        let calendar = Arc::new(FakeCalendar {
            entries: Mutex::new(Vec::new()),
            fail,
        });
        let clock: Clock = Arc::new(|| at(2024, 4, 1));
        let extractor = Extractor::new(Arc::new(StaticOcr), Arc::new(StaticModel)).with_clock(clock.clone());
        let forwarder = CalendarForwarder::new(extractor, calendar.clone()).with_clock(clock);
        (forwarder, calendar)
    }

    #[tokio::test]
    async fn test_handler_forwards_only_upcoming_events() {
        let (forwarder, calendar) = forwarder(false);
        let photo = Photo::from_path("/tmp/venue_7.jpg").unwrap();

        forwarder.handle(&photo).await.unwrap();

        let entries = calendar.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Neu"));
        assert_eq!(
            entries[0].start,
            at(2024, 4, 20).date().and_hms_opt(20, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_calendar_failure_is_reported() {
        let (forwarder, _calendar) = forwarder(true);
        let photo = Photo::from_path("/tmp/venue_7.jpg").unwrap();

        assert!(forwarder.handle(&photo).await.is_err());
    }
}
