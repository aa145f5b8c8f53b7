//! Error types for the validation engine.
//!
//! Validation failures are never errors; they are `ErrorEntry` data in the
//! snapshot. These types cover rule registration, which is fatal and happens
//! once at setup, and misuse of the engine by its host.

use formguard_rules::RuleError;
use formguard_types::{FieldPath, RuleKind};
use thiserror::Error;

/// Result type for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Rejected rule registrations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A path given at registration does not parse.
    #[error("invalid field path {0:?}")]
    InvalidPath(String),

    /// A rule lists its own field as a dependency.
    #[error("rule {rule} on {field} depends on its own field")]
    SelfDependency { field: FieldPath, rule: RuleKind },

    /// Two rules of the same kind on one field.
    #[error("duplicate rule {rule} on {field}")]
    DuplicateRule { field: FieldPath, rule: RuleKind },

    /// The dependency graph between fields has a cycle.
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<FieldPath> },

    /// A rule failed to build.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

fn format_cycle(cycle: &[FieldPath]) -> String {
    cycle
        .iter()
        .map(FieldPath::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors reported to the host.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host reported an event for a path it does not contain.
    #[error("unknown field: {0}")]
    UnknownField(FieldPath),

    /// The engine's internal event channel closed.
    #[error("event channel closed")]
    ChannelClosed,
}
