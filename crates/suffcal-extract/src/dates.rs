//! Date and time-of-day normalization.
//!
//! Flyers write dates in every imaginable way and usually leave out the
//! year. [`parse_date_text`] tries, in order:
//!
//! 1. strict ISO 8601 (`2024-05-01`, `2024-05-01T19:30:00`)
//! 2. explicit formats: `01.05.2024`, `01.05.24`, `01/05/2024`, `01/05/24`,
//!    `2024-05-01`, `2024/05/01`
//! 3. a lenient scan for a date embedded in text, including month names in
//!    German and English (`Samstag, 12. März 2024`, `May 3, 2024`)
//!
//! and if nothing matches, all of it again with the current year appended.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use serde_json::Value;

use suffcal_models::EventDate;

/// Explicit day-first and year-first formats.
const EXPLICIT_FORMATS: &[&str] = &[
    "%d.%m.%Y", "%d.%m.%y", "%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d", "%Y/%m/%d",
];

/// `01.05.2024`, `1/5/24` anywhere in the text.
static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4}|\d{2})\b").expect("Invalid numeric date regex")
});

/// `2024-05-01` anywhere in the text.
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("Invalid ISO date regex")
});

/// `12. März 2024`, `3 may, 2024`.
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\.?\s*(\p{L}+)\.?,?\s*(\d{4})\b")
        .expect("Invalid day month year regex")
});

/// `May 3, 2024`, `März 12. 2024`.
static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\p{L}+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?\.?,?\s+(\d{4})\b")
        .expect("Invalid month day year regex")
});

/// `19:30`, `19.30`, `7:30 pm`. Group 4 catches dates such as `01.05.2024`.
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})[:.](\d{2})(?:\s*([ap])\.?m\b\.?|\b)([:.]\d)?")
        .expect("Invalid clock time regex")
});

/// `19 Uhr`, `7 pm`, `7pm`.
static HOUR_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(uhr\b|[ap]\.?m\b\.?)").expect("Invalid hour regex")
});

/// A date field as read from the model answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDate {
    /// No date was supplied.
    Absent,
    /// An already structured date.
    Structured(NaiveDateTime),
    /// Free text to be parsed.
    Text(String),
    /// A value that cannot be a date at all.
    Invalid,
}

impl RawDate {
    /// Classifies a JSON field.
    ///
    /// `null`, a missing key and a blank string are all "absent". Numbers
    /// are treated as text so that `20240501` still gets a chance.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) if s.trim().is_empty() => Self::Absent,
            Some(Value::String(s)) => Self::Text(s.trim().to_string()),
            Some(Value::Number(n)) => Self::Text(n.to_string()),
            Some(_) => Self::Invalid,
        }
    }
}

/// Resolves a raw date against the current time.
///
/// Absent dates become the `now` sentinel; text that cannot be parsed is
/// unresolved and must not be forwarded.
pub fn resolve_date(raw: &RawDate, now: NaiveDateTime) -> EventDate {
    match raw {
        RawDate::Absent => EventDate::Defaulted(now),
        RawDate::Structured(date) => EventDate::Resolved(*date),
        RawDate::Text(text) => match parse_date_text(text, now.year()) {
            Some(date) => EventDate::Resolved(date),
            None => EventDate::Unresolved,
        },
        RawDate::Invalid => EventDate::Unresolved,
    }
}

/// Parses free-text date, appending `current_year` if the text has none.
///
/// # Example
/// ```
/// use suffcal_extract::parse_date_text;
///
/// let date = parse_date_text("12. März", 2024).unwrap();
/// assert_eq!(date.to_string(), "2024-03-12 00:00:00");
/// ```
pub fn parse_date_text(text: &str, current_year: i32) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    parse_once(text).or_else(|| {
        [
            format!("{}{}", text, current_year),
            format!("{} {}", text, current_year),
            format!("{}.{}", text.trim_end_matches('.'), current_year),
        ]
        .iter()
        .find_map(|candidate| parse_once(candidate))
    })
}

fn parse_once(text: &str) -> Option<NaiveDateTime> {
    parse_iso(text)
        .or_else(|| parse_explicit(text))
        .or_else(|| parse_lenient(text))
}

fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_local());
    }
    if let Ok(datetime) = text.parse::<NaiveDateTime>() {
        return Some(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return Some(datetime);
    }
    text.parse::<NaiveDate>().ok().map(start_of_day)
}

fn parse_explicit(text: &str) -> Option<NaiveDateTime> {
    EXPLICIT_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            // %Y also accepts two digits
            .filter(|date| !format.contains("%Y") || date.year() >= 1000)
            .map(start_of_day)
    })
}

fn parse_lenient(text: &str) -> Option<NaiveDateTime> {
    let from_numeric = |caps: Captures<'_>| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        NaiveDate::from_ymd_opt(year, month, day)
    };
    let from_iso = |caps: Captures<'_>| {
        NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    };
    let from_day_month = |caps: Captures<'_>| {
        let day = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, day)
    };
    let from_month_day = |caps: Captures<'_>| {
        let month = month_number(&caps[1])?;
        let day = caps[2].parse().ok()?;
        NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, day)
    };

    ISO_DATE
        .captures_iter(text)
        .find_map(from_iso)
        .or_else(|| NUMERIC_DATE.captures_iter(text).find_map(from_numeric))
        .or_else(|| DAY_MONTH_YEAR.captures_iter(text).find_map(from_day_month))
        .or_else(|| MONTH_DAY_YEAR.captures_iter(text).find_map(from_month_day))
        .map(start_of_day)
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

fn expand_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// Maps German and English month names and abbreviations to 1..=12.
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.as_str() {
        "januar" | "january" | "jan" | "jänner" => 1,
        "februar" | "february" | "feb" => 2,
        "märz" | "maerz" | "marz" | "march" | "mar" | "mär" => 3,
        "april" | "apr" => 4,
        "mai" | "may" => 5,
        "juni" | "june" | "jun" => 6,
        "juli" | "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "oktober" | "october" | "okt" | "oct" => 10,
        "november" | "nov" => 11,
        "dezember" | "december" | "dez" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parses a time of day such as `19:30`, `19.30`, `19 Uhr` or `7 pm`.
///
/// Returns the first time found in the text.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = CLOCK_TIME.captures_iter(text).find(|c| c.get(4).is_none()) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let meridiem = caps.get(3).map(|m| m.as_str());
        return NaiveTime::from_hms_opt(to_24h(hour, meridiem)?, minute, 0);
    }

    let caps = HOUR_ONLY.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let suffix = caps[2].to_lowercase();
    let meridiem = if suffix.starts_with("uhr") {
        None
    } else {
        Some(&suffix[..1])
    };
    NaiveTime::from_hms_opt(to_24h(hour, meridiem)?, 0, 0)
}

fn to_24h(hour: u32, meridiem: Option<&str>) -> Option<u32> {
    match meridiem.map(str::to_lowercase).as_deref() {
        None => Some(hour),
        Some(_) if hour == 0 || hour > 12 => None,
        Some("a") => Some(hour % 12),
        Some(_) => Some(hour % 12 + 12),
    }
}
