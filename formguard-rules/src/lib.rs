//! Synchronous rule primitives for formguard.
//!
//! Every check in this crate is a pure function of the field's own value,
//! the values of sibling fields it declares, and the current date. They run
//! on every relevant change and must tolerate being invoked far more often
//! than their result changes.
//!
//! - [`SyncRule`] — the registered form of a check, with its dependencies
//! - [`checks`] — the individual primitives (length, pattern, dates, files, ...)
//! - [`strength`] — deterministic password strength scoring
//! - [`ZipTable`] — per-country postal code formats
//!
//! Rules never produce errors for other fields and never mutate anything;
//! the engine decides where and when a [`Failure`] becomes an error entry.

pub mod checks;
mod context;
mod error;
pub mod strength;
mod sync_rule;
mod zip;

pub use context::{RuleContext, ValueSource};
pub use error::{RuleError, RuleResult};
pub use strength::{PasswordStrength, StrengthLabel, score};
pub use sync_rule::{Predicate, SyncRule};
pub use zip::ZipTable;

use formguard_types::{ErrorKind, ErrorPayload};

/// A failed check: what went wrong, with detail. The engine attaches the
/// field path, producing rule and generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub payload: ErrorPayload,
}

impl Failure {
    /// A failure whose kind says it all.
    pub fn bare(kind: ErrorKind) -> Self {
        Self {
            kind,
            payload: ErrorPayload::None,
        }
    }

    pub fn with(kind: ErrorKind, payload: ErrorPayload) -> Self {
        Self { kind, payload }
    }
}
