//! Rule discriminants and in-flight check bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::FieldPath;

/// Identifies a rule on a field. A field may carry at most one rule of
/// each kind; business rules are distinguished by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    Required,
    RequiredTrue,
    ConditionalRequired,
    LengthBounds,
    NumericBounds,
    Pattern,
    Email,
    PhoneNumber,
    AgeRange,
    DateOrder,
    MinDate,
    MaxDate,
    UrlFormat,
    ZipFormat,
    FileConstraint,
    PasswordMatch,
    PasswordStrength,
    UsernameAvailable,
    EmailAvailable,
    EmailDomain,
    ZipCodeValid,
    BusinessRule(String),
}

const BUSINESS_PREFIX: &str = "businessRule:";

impl RuleKind {
    /// Whether rules of this kind call the remote verification service.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Self::UsernameAvailable
                | Self::EmailAvailable
                | Self::EmailDomain
                | Self::ZipCodeValid
                | Self::BusinessRule(_)
        )
    }

    fn as_static_str(&self) -> Option<&'static str> {
        Some(match self {
            Self::Required => "required",
            Self::RequiredTrue => "requiredTrue",
            Self::ConditionalRequired => "conditionalRequired",
            Self::LengthBounds => "lengthBounds",
            Self::NumericBounds => "numericBounds",
            Self::Pattern => "pattern",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::AgeRange => "ageRange",
            Self::DateOrder => "dateOrder",
            Self::MinDate => "minDate",
            Self::MaxDate => "maxDate",
            Self::UrlFormat => "urlFormat",
            Self::ZipFormat => "zipFormat",
            Self::FileConstraint => "fileConstraint",
            Self::PasswordMatch => "passwordMatch",
            Self::PasswordStrength => "passwordStrength",
            Self::UsernameAvailable => "usernameAvailable",
            Self::EmailAvailable => "emailAvailable",
            Self::EmailDomain => "emailDomain",
            Self::ZipCodeValid => "zipCodeValid",
            Self::BusinessRule(_) => return None,
        })
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusinessRule(name) => write!(f, "{BUSINESS_PREFIX}{name}"),
            other => f.write_str(other.as_static_str().unwrap_or_default()),
        }
    }
}

impl From<String> for RuleKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "required" => Self::Required,
            "requiredTrue" => Self::RequiredTrue,
            "conditionalRequired" => Self::ConditionalRequired,
            "lengthBounds" => Self::LengthBounds,
            "numericBounds" => Self::NumericBounds,
            "pattern" => Self::Pattern,
            "email" => Self::Email,
            "phoneNumber" => Self::PhoneNumber,
            "ageRange" => Self::AgeRange,
            "dateOrder" => Self::DateOrder,
            "minDate" => Self::MinDate,
            "maxDate" => Self::MaxDate,
            "urlFormat" => Self::UrlFormat,
            "zipFormat" => Self::ZipFormat,
            "fileConstraint" => Self::FileConstraint,
            "passwordMatch" => Self::PasswordMatch,
            "passwordStrength" => Self::PasswordStrength,
            "usernameAvailable" => Self::UsernameAvailable,
            "emailAvailable" => Self::EmailAvailable,
            "emailDomain" => Self::EmailDomain,
            "zipCodeValid" => Self::ZipCodeValid,
            other => Self::BusinessRule(
                other
                    .strip_prefix(BUSINESS_PREFIX)
                    .unwrap_or(other)
                    .to_string(),
            ),
        }
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        kind.to_string()
    }
}

/// Unique per remote-check invocation. A result is only applied when its
/// token still matches the one recorded for its (field, rule) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckToken(u64);

impl CheckToken {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The token minted after this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CheckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An issued remote check that has not resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheck {
    pub field_path: FieldPath,
    pub rule_kind: RuleKind,
    pub token: CheckToken,
    pub started_at: Instant,
}

impl PendingCheck {
    /// Records a check issued now.
    pub fn start(field_path: FieldPath, rule_kind: RuleKind, token: CheckToken) -> Self {
        Self {
            field_path,
            rule_kind,
            token,
            started_at: Instant::now(),
        }
    }
}
