//! Photo identifiers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Post identifier assigned by the media network.
///
/// The id is embedded in every stored file name and is the sole
/// deduplication key of the photo store. Network ids are usually decimal
/// numbers, so all-digit ids are ordered numerically; anything else is
/// ordered after them, lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id consists only of ASCII digits.
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    fn digits(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }
}

impl Ord for PhotoId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_numeric(), other.is_numeric()) {
            (true, true) => {
                let (a, b) = (self.digits(), other.digits());
                a.len()
                    .cmp(&b.len())
                    .then_with(|| a.cmp(b))
                    .then_with(|| self.0.cmp(&other.0))
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for PhotoId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PhotoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for PhotoId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl AsRef<str> for PhotoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        let small = PhotoId::from("999");
        let large = PhotoId::from("3120000000000000001");
        assert!(small < large);
        assert!(PhotoId::from("10") > PhotoId::from("9"));
    }

    #[test]
    fn test_leading_zeros_compare_by_value() {
        assert!(PhotoId::from("010") > PhotoId::from("9"));
        assert_ne!(PhotoId::from("010"), PhotoId::from("10"));
    }

    #[test]
    fn test_text_ids_sort_after_numeric() {
        assert!(PhotoId::from("abc") > PhotoId::from("123"));
        assert!(PhotoId::from("abc") < PhotoId::from("abd"));
    }

    #[test]
    fn test_serde_transparent() {
        let id = PhotoId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }
}
