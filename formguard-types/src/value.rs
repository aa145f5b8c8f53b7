//! Field values.
//!
//! The engine never interprets a value itself; each rule picks the view it
//! needs (`as_text`, `as_number`, `as_date`, ...). Text values are parsed
//! leniently so a host that only stores strings still gets numeric and
//! date checks.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Metadata of an uploaded file. The engine never sees file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// File name including extension (e.g. `resume.PDF`).
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

impl FileMeta {
    /// Creates file metadata.
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    /// Lowercased extension after the last dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// The current value of one leaf slot in the field tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// No value (null / never set).
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    File(FileMeta),
}

impl FieldValue {
    /// Shorthand for a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Absent or the empty string. `false` and `0` are values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Absent, empty, or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            other => other.is_empty(),
        }
    }

    /// Borrowed text, only for text values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text representation used when a value is sent to a remote check.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Self::File(f) => Some(f.name.clone()),
        }
    }

    /// Numeric view. Text is parsed after trimming; NaN is treated as absent.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (!n.is_nan()).then_some(n)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Calendar date view. Date-times drop their time of day.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::DateTime(dt) => Some(dt.date()),
            Self::Text(s) => parse_date_time(s).map(|dt| dt.date()),
            _ => None,
        }
    }

    /// Date-time view. Plain dates sit at midnight, so two plain dates on
    /// the same day compare equal.
    #[must_use]
    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => d.and_hms_opt(0, 0, 0),
            Self::DateTime(dt) => Some(*dt),
            Self::Text(s) => parse_date_time(s),
            _ => None,
        }
    }

    /// Whether the value encodes a time of day, not just a calendar date.
    #[must_use]
    pub fn has_time_of_day(&self) -> bool {
        match self {
            Self::DateTime(_) => true,
            Self::Text(s) => {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_err()
                    && parse_date_time(s).is_some()
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&FileMeta> {
        match self {
            Self::File(f) => Some(f),
            _ => None,
        }
    }

    /// Converts a JSON scalar into a field value.
    ///
    /// Objects and arrays are groups, not values, and map to `Empty`; the
    /// tree builder handles them before reaching this point.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Empty, Self::Number),
            serde_json::Value::Bool(b) => Self::Bool(*b),
            _ => Self::Empty,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<FileMeta> for FieldValue {
    fn from(f: FileMeta) -> Self {
        Self::File(f)
    }
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}
