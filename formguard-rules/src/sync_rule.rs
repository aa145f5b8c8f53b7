//! Registered synchronous rules.

use chrono::NaiveDate;
use formguard_types::{ErrorKind, ErrorPayload, FieldPath, FieldValue, RuleKind};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::checks;
use crate::context::{RuleContext, ValueSource};
use crate::error::{RuleError, RuleResult};
use crate::strength;
use crate::zip::ZipTable;
use crate::Failure;

fn non_empty_text(value: &FieldValue) -> Option<String> {
    value.to_text().filter(|s| !s.is_empty())
}

/// Condition for [`SyncRule::ConditionalRequired`].
///
/// Called on every evaluation; it may read sibling values through the
/// source or external state captured by the closure.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&dyn ValueSource) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&dyn ValueSource) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// True when `path` currently holds the text `expected`.
    pub fn field_equals(path: FieldPath, expected: impl Into<String>) -> Self {
        let expected = expected.into();
        Self::new(move |values| {
            values
                .value(&path)
                .and_then(FieldValue::as_text)
                .is_some_and(|v| v == expected)
        })
    }

    #[must_use]
    pub fn holds(&self, values: &dyn ValueSource) -> bool {
        (self.0)(values)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// A synchronous rule as bound to a field.
///
/// Cross-field variants name the sibling fields they read; those paths
/// become the rule's dependencies.
#[derive(Debug, Clone)]
pub enum SyncRule {
    Required,
    RequiredTrue,
    ConditionalRequired {
        predicate: Predicate,
        depends_on: Vec<FieldPath>,
    },
    LengthBounds {
        min: Option<usize>,
        max: Option<usize>,
    },
    NumericBounds {
        min: Option<f64>,
        max: Option<f64>,
    },
    Pattern {
        source: String,
        anchored: Regex,
    },
    Email,
    PhoneNumber,
    AgeRange {
        min_age: u32,
        max_age: u32,
    },
    /// Bound to the end field; reads the start field.
    DateOrder { start: FieldPath },
    MinDate(NaiveDate),
    MaxDate(NaiveDate),
    UrlFormat,
    ZipFormat {
        country: FieldPath,
        table: ZipTable,
    },
    FileConstraint {
        max_size_mb: Option<f64>,
        allowed_extensions: Option<Vec<String>>,
    },
    /// Bound to the confirmation field; reads the primary password.
    PasswordMatch { password: FieldPath },
    PasswordStrength { min_score: i32 },
}

impl SyncRule {
    pub fn length(min: Option<usize>, max: Option<usize>) -> RuleResult<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(RuleError::InvalidBounds {
                    min: lo as f64,
                    max: hi as f64,
                });
            }
        }
        Ok(Self::LengthBounds { min, max })
    }

    pub fn numeric(min: Option<f64>, max: Option<f64>) -> RuleResult<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(RuleError::InvalidBounds { min: lo, max: hi });
            }
        }
        Ok(Self::NumericBounds { min, max })
    }

    /// A full-match pattern rule.
    pub fn pattern(source: &str) -> RuleResult<Self> {
        let anchored =
            Regex::new(&format!("^(?:{source})$")).map_err(|e| RuleError::InvalidPattern {
                pattern: source.to_string(),
                source: e,
            })?;
        Ok(Self::Pattern {
            source: source.to_string(),
            anchored,
        })
    }

    pub fn age_range(min_age: u32, max_age: u32) -> RuleResult<Self> {
        if min_age > max_age {
            return Err(RuleError::InvalidBounds {
                min: f64::from(min_age),
                max: f64::from(max_age),
            });
        }
        Ok(Self::AgeRange { min_age, max_age })
    }

    /// Zip format against the builtin country table.
    pub fn zip_format(country: FieldPath) -> Self {
        Self::ZipFormat {
            country,
            table: ZipTable::builtin().clone(),
        }
    }

    /// File size and/or extension limits. Extensions are matched case-insensitively.
    pub fn file(max_size_mb: Option<f64>, allowed_extensions: Option<&[&str]>) -> RuleResult<Self> {
        if max_size_mb.is_none() && allowed_extensions.is_none() {
            return Err(RuleError::EmptyFileConstraint);
        }
        Ok(Self::FileConstraint {
            max_size_mb,
            allowed_extensions: allowed_extensions.map(|exts| {
                exts.iter()
                    .map(|e| e.trim_start_matches('.').to_lowercase())
                    .collect()
            }),
        })
    }

    pub fn conditional_required(predicate: Predicate, depends_on: Vec<FieldPath>) -> Self {
        Self::ConditionalRequired {
            predicate,
            depends_on,
        }
    }

    /// The discriminant this rule registers under.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Required => RuleKind::Required,
            Self::RequiredTrue => RuleKind::RequiredTrue,
            Self::ConditionalRequired { .. } => RuleKind::ConditionalRequired,
            Self::LengthBounds { .. } => RuleKind::LengthBounds,
            Self::NumericBounds { .. } => RuleKind::NumericBounds,
            Self::Pattern { .. } => RuleKind::Pattern,
            Self::Email => RuleKind::Email,
            Self::PhoneNumber => RuleKind::PhoneNumber,
            Self::AgeRange { .. } => RuleKind::AgeRange,
            Self::DateOrder { .. } => RuleKind::DateOrder,
            Self::MinDate(_) => RuleKind::MinDate,
            Self::MaxDate(_) => RuleKind::MaxDate,
            Self::UrlFormat => RuleKind::UrlFormat,
            Self::ZipFormat { .. } => RuleKind::ZipFormat,
            Self::FileConstraint { .. } => RuleKind::FileConstraint,
            Self::PasswordMatch { .. } => RuleKind::PasswordMatch,
            Self::PasswordStrength { .. } => RuleKind::PasswordStrength,
        }
    }

    /// Sibling fields this rule reads.
    #[must_use]
    pub fn depends_on(&self) -> Vec<FieldPath> {
        match self {
            Self::ConditionalRequired { depends_on, .. } => depends_on.clone(),
            Self::DateOrder { start } => vec![start.clone()],
            Self::ZipFormat { country, .. } => vec![country.clone()],
            Self::PasswordMatch { password } => vec![password.clone()],
            _ => Vec::new(),
        }
    }

    /// Evaluates the rule against the field's current value.
    #[must_use]
    pub fn evaluate(&self, value: &FieldValue, ctx: &RuleContext<'_>) -> Option<Failure> {
        match self {
            Self::Required => checks::required(value),
            Self::RequiredTrue => checks::required_true(value),
            Self::ConditionalRequired { predicate, .. } => (predicate.holds(ctx.values())
                && value.is_blank())
            .then(|| Failure::bare(ErrorKind::Required)),
            Self::LengthBounds { min, max } => checks::length_bounds(value, *min, *max),
            Self::NumericBounds { min, max } => checks::numeric_bounds(value, *min, *max),
            Self::Pattern { source, anchored } => checks::pattern(value, anchored, source),
            Self::Email => checks::email(value),
            Self::PhoneNumber => checks::phone_number(value),
            Self::AgeRange { min_age, max_age } => {
                checks::age_range(value, *min_age, *max_age, ctx.today())
            }
            Self::DateOrder { start } => checks::date_order(ctx.sibling(start), value),
            Self::MinDate(limit) => checks::min_date(value, *limit),
            Self::MaxDate(limit) => checks::max_date(value, *limit),
            Self::UrlFormat => checks::url_format(value),
            Self::ZipFormat { country, table } => {
                let zip = non_empty_text(value)?;
                let country = non_empty_text(ctx.sibling(country))?;
                match table.matches(&country, &zip) {
                    Some(false) => Some(Failure::with(
                        ErrorKind::ZipCode,
                        ErrorPayload::Country { country },
                    )),
                    _ => None,
                }
            }
            Self::FileConstraint {
                max_size_mb,
                allowed_extensions,
            } => checks::file_constraint(value, *max_size_mb, allowed_extensions.as_deref()),
            Self::PasswordMatch { password } => {
                (non_empty_text(ctx.sibling(password)) != non_empty_text(value))
                    .then(|| Failure::bare(ErrorKind::PasswordMatch))
            }
            Self::PasswordStrength { min_score } => {
                let password = value.as_text().filter(|p| !p.is_empty())?;
                let report = strength::score(password);
                (report.score < *min_score).then(|| {
                    Failure::with(
                        ErrorKind::PasswordStrength,
                        ErrorPayload::Strength {
                            score: report.score,
                            min_score: *min_score,
                            feedback: report.feedback,
                        },
                    )
                })
            }
        }
    }
}
