//! Error types for remote verification.

use thiserror::Error;

/// Result type for verification calls.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Transport-level failures of a verification call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with something unusable.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The service is temporarily unavailable.
    #[error("verification service unavailable")]
    Unavailable,

    /// No answer in time.
    #[error("verification timed out")]
    Timeout,

    /// The verifier has no implementation for this business rule.
    #[error("unsupported business rule: {0}")]
    Unsupported(String),
}
