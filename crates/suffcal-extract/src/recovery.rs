//! Staged repair of JSON written by a language model.
//!
//! Stages run in order and the first one producing a JSON object or list
//! wins:
//!
//! 1. parse the completion as-is
//! 2. [`normalize`] it and parse again
//! 3. cut out the first balanced `{...}`/`[...]` ([`balanced_substring`])
//! 4. close whatever a truncated document left open ([`rebalance`])
//! 5. drop the incomplete trailing member and close again
//!
//! This covers prose around the document, single quotes, trailing commas
//! and truncation. It is not a general JSON repair algorithm.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// A comma directly before a closing bracket, with surrounding blanks.
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*([}\]])").expect("Invalid trailing comma regex"));

/// The completion could not be turned into a JSON object or list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse model response as JSON: {raw}")]
pub struct RecoveryError {
    /// The completion as received.
    pub raw: String,
}

/// Collapses newlines, turns single quotes into double quotes and strips
/// trailing commas before closing brackets.
pub fn normalize(text: &str) -> String {
    let flattened = text.trim().replace(['\r', '\n'], " ").replace('\'', "\"");
    TRAILING_COMMA.replace_all(&flattened, "$1").into_owned()
}

/// Parses text that must be a JSON object or list.
pub fn parse_document(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Result of scanning from the first opening bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scan<'a> {
    /// Text from the first opening bracket up to where it closes, or to
    /// the end of the input if it never closes.
    candidate: &'a str,
    /// Brackets still open at the end of the candidate, innermost last.
    open: Vec<char>,
    /// Whether the candidate ends inside a string literal.
    in_string: bool,
}

fn closer_for(opener: char) -> char {
    if opener == '{' {
        '}'
    } else {
        ']'
    }
}

/// Walks the text tracking bracket nesting outside string literals.
fn scan(text: &str) -> Option<Scan<'_>> {
    let start = text.find(['{', '['])?;
    let tail = &text[start..];

    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in tail.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => open.push(ch),
            '}' | ']' => {
                if open.last().map(|&o| closer_for(o)) == Some(ch) {
                    open.pop();
                    if open.is_empty() {
                        return Some(Scan {
                            candidate: &tail[..offset + ch.len_utf8()],
                            open,
                            in_string: false,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Some(Scan {
        candidate: tail,
        open,
        in_string,
    })
}

/// Returns the first balanced `{...}` or `[...]` in the text.
pub fn balanced_substring(text: &str) -> Option<&str> {
    scan(text)
        .filter(|s| s.open.is_empty())
        .map(|s| s.candidate)
}

/// Appends the closers a truncated document is missing.
///
/// Starts at the first opening bracket; an unterminated string is closed
/// first, then every open bracket in reverse order.
pub fn rebalance(text: &str) -> Option<String> {
    let scan = scan(text)?;
    let mut completed = scan.candidate.to_string();
    if scan.in_string {
        completed.push('"');
    }
    completed.extend(scan.open.iter().rev().map(|&o| closer_for(o)));
    Some(completed)
}

/// Drops everything after the last comma, then closes the document.
fn trim_incomplete_member(text: &str) -> Option<String> {
    let candidate = scan(text)?.candidate;
    let cut = candidate.rfind(',')?;
    rebalance(&candidate[..cut])
}

/// Recovers a JSON object or list from a model completion.
///
/// # Example
/// ```
/// use suffcal_extract::recover_json;
///
/// let value = recover_json(r#"Sure! {"Titel": "Konzert", "Datum": "2024-05-01""#).unwrap();
/// assert_eq!(value["Titel"], "Konzert");
/// ```
pub fn recover_json(raw: &str) -> std::result::Result<Value, RecoveryError> {
    if let Some(value) = parse_document(raw.trim()) {
        return Ok(value);
    }

    let normalized = normalize(raw);
    if let Some(value) = parse_document(&normalized) {
        trace!("recovered JSON after normalization");
        return Ok(value);
    }

    if let Some(candidate) = balanced_substring(&normalized) {
        if let Some(value) = parse_document(&normalize(candidate)) {
            trace!("recovered JSON from balanced substring");
            return Ok(value);
        }
    }

    if let Some(completed) = rebalance(&normalized) {
        if let Some(value) = parse_document(&normalize(&completed)) {
            trace!("recovered JSON by closing truncated document");
            return Ok(value);
        }
    }

    if let Some(trimmed) = trim_incomplete_member(&normalized) {
        if let Some(value) = parse_document(&normalize(&trimmed)) {
            trace!("recovered JSON by dropping incomplete member");
            return Ok(value);
        }
    }

    Err(RecoveryError {
        raw: raw.to_string(),
    })
}
