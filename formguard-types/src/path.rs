//! Dot-addressable field paths.
//!
//! A path names one node of the field tree: `email`, `address.zipCode`,
//! `addresses.0.city`. Array items use numeric segments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Location of a field or group inside the field tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    /// Parses a path, rejecting empty strings and empty segments (`a..b`, `.a`).
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() || s.split('.').any(str::is_empty) {
            return Err(Error::InvalidPath(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns the last segment (the field's own name).
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Returns the enclosing group's path, or `None` for a top-level field.
    #[must_use]
    pub fn parent(&self) -> Option<FieldPath> {
        self.0
            .rfind('.')
            .map(|idx| FieldPath(self.0[..idx].to_string()))
    }

    /// A top-level path. The segment must be non-empty and dot-free; this is
    /// only checked in debug builds.
    #[must_use]
    pub fn from_segment(segment: &str) -> FieldPath {
        debug_assert!(is_segment(segment), "invalid path segment {segment:?}");
        FieldPath(segment.to_string())
    }

    /// Appends a segment, under the same contract as [`FieldPath::from_segment`].
    #[must_use]
    pub fn child(&self, segment: &str) -> FieldPath {
        debug_assert!(is_segment(segment), "invalid path segment {segment:?}");
        FieldPath(format!("{}.{}", self.0, segment))
    }

    /// Whether `self` is `other` or lies beneath it.
    #[must_use]
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'.'))
    }
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('.')
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
