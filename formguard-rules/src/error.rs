//! Error types for rule construction.

use thiserror::Error;

/// Result type for rule construction.
pub type RuleResult<T> = Result<T, RuleError>;

/// Errors raised while building a rule. Evaluation itself never fails.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The pattern is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Lower bound above upper bound.
    #[error("invalid bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: f64, max: f64 },

    /// A file rule with neither a size limit nor an extension list.
    #[error("file constraint needs a size limit or allowed extensions")]
    EmptyFileConstraint,
}
