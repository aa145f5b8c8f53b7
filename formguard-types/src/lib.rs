//! Core type definitions for formguard.
//!
//! This crate defines the data model shared by the rule primitives, the
//! verification capability and the validation engine:
//! - Field paths (dot-addressable locations in a nested field tree)
//! - Field values (opaque to the engine, interpreted by individual rules)
//! - Error entries and their kind-specific payloads
//! - Rule discriminants and the tokens used to track in-flight checks
//! - The immutable validation snapshot handed back to the field-tree host
//!
//! Nothing in here performs validation. Rules live in `formguard-rules`,
//! evaluation order and async scheduling live in `formguard-engine`.

mod entry;
mod path;
mod rule;
mod snapshot;
mod value;

pub use entry::{ErrorEntry, ErrorKind, ErrorPayload};
pub use path::FieldPath;
pub use rule::{CheckToken, PendingCheck, RuleKind};
pub use snapshot::ValidationSnapshot;
pub use value::{FieldValue, FileMeta};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid field path: {0:?}")]
    InvalidPath(String),
}
