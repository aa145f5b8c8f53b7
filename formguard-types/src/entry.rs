//! Error entries produced by failed rules.
//!
//! Validation failures are data, never `Err`. Each entry names the field it
//! belongs to, a kind used for message lookup, a kind-specific payload and
//! the rule that produced it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{FieldPath, RuleKind};

/// Discriminant of a validation failure.
///
/// The string forms are stable and match the keys hosts use for message
/// lookup (`minlength`, `passwordMatch`, `usernameTaken`, ...). Kinds not
/// known to the engine, such as the error kind of a business rule, are
/// carried as [`ErrorKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    Required,
    MinLength,
    MaxLength,
    Min,
    Max,
    Pattern,
    Email,
    PhoneNumber,
    AgeRange,
    DateRange,
    MinDate,
    MaxDate,
    Url,
    ZipCode,
    FileSize,
    FileType,
    PasswordMatch,
    PasswordStrength,
    UsernameTaken,
    EmailTaken,
    InvalidDomain,
    InvalidZipCode,
    Custom(String),
}

impl ErrorKind {
    /// The stable string key for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::MinLength => "minlength",
            Self::MaxLength => "maxlength",
            Self::Min => "min",
            Self::Max => "max",
            Self::Pattern => "pattern",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::AgeRange => "ageRange",
            Self::DateRange => "dateRange",
            Self::MinDate => "minDate",
            Self::MaxDate => "maxDate",
            Self::Url => "url",
            Self::ZipCode => "zipCode",
            Self::FileSize => "fileSize",
            Self::FileType => "fileType",
            Self::PasswordMatch => "passwordMatch",
            Self::PasswordStrength => "passwordStrength",
            Self::UsernameTaken => "usernameTaken",
            Self::EmailTaken => "emailTaken",
            Self::InvalidDomain => "invalidDomain",
            Self::InvalidZipCode => "invalidZipCode",
            Self::Custom(key) => key,
        }
    }
}

impl From<&str> for ErrorKind {
    fn from(s: &str) -> Self {
        match s {
            "required" => Self::Required,
            "minlength" => Self::MinLength,
            "maxlength" => Self::MaxLength,
            "min" => Self::Min,
            "max" => Self::Max,
            "pattern" => Self::Pattern,
            "email" => Self::Email,
            "phoneNumber" => Self::PhoneNumber,
            "ageRange" => Self::AgeRange,
            "dateRange" => Self::DateRange,
            "minDate" => Self::MinDate,
            "maxDate" => Self::MaxDate,
            "url" => Self::Url,
            "zipCode" => Self::ZipCode,
            "fileSize" => Self::FileSize,
            "fileType" => Self::FileType,
            "passwordMatch" => Self::PasswordMatch,
            "passwordStrength" => Self::PasswordStrength,
            "usernameTaken" => Self::UsernameTaken,
            "emailTaken" => Self::EmailTaken,
            "invalidDomain" => Self::InvalidDomain,
            "invalidZipCode" => Self::InvalidZipCode,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for ErrorKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific structured detail attached to an entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorPayload {
    /// The kind says it all.
    #[default]
    None,
    /// `minlength` / `maxlength`.
    Length {
        required_length: usize,
        actual_length: usize,
    },
    /// `min` / `max`.
    Bound { limit: f64, actual: f64 },
    /// `pattern`.
    Pattern { pattern: String },
    /// `ageRange`.
    AgeRange {
        min_age: u32,
        max_age: u32,
        actual_age: i32,
    },
    /// `minDate` / `maxDate`.
    DateBound { limit: NaiveDate, actual: NaiveDate },
    /// `zipCode` / `invalidZipCode`.
    Country { country: String },
    /// `fileSize`, both sizes in MB rounded to two decimals.
    FileSize {
        max_size_mb: f64,
        actual_size_mb: f64,
    },
    /// `fileType`.
    FileType {
        allowed: Vec<String>,
        actual: Option<String>,
    },
    /// `passwordStrength`.
    Strength {
        score: i32,
        min_score: i32,
        feedback: Vec<String>,
    },
    /// `invalidDomain`.
    Domain { domain: String },
}

/// The result of one failed rule on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// The field carrying the error.
    pub field_path: FieldPath,
    /// Message-lookup discriminant.
    pub kind: ErrorKind,
    /// Kind-specific detail.
    pub payload: ErrorPayload,
    /// The rule that produced this entry.
    pub produced_by: RuleKind,
    /// Engine generation at which this entry was first produced.
    pub generation: u64,
}

impl ErrorEntry {
    /// Creates an entry.
    pub fn new(
        field_path: FieldPath,
        kind: ErrorKind,
        payload: ErrorPayload,
        produced_by: RuleKind,
        generation: u64,
    ) -> Self {
        Self {
            field_path,
            kind,
            payload,
            produced_by,
            generation,
        }
    }

    /// Same failure, ignoring the generation it was produced at.
    #[must_use]
    pub fn same_failure(&self, other: &Self) -> bool {
        self.field_path == other.field_path
            && self.kind == other.kind
            && self.payload == other.payload
            && self.produced_by == other.produced_by
    }
}
