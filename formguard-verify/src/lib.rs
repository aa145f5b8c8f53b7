//! Remote verification capability for formguard.
//!
//! Async rules (username and email availability, email-domain validity,
//! remote zip validity, generic business rules) call out through the
//! [`RemoteVerifier`] trait. The engine never knows whether a verifier talks
//! to a network service, a database or an in-memory table; it is handed one
//! at construction time.
//!
//! A verifier error is an infrastructure failure, not a validation failure.
//! The engine downgrades it to "inconclusive" and raises no error on the
//! field.

mod call;
mod error;
pub mod mock;
mod verifier;

pub use call::VerifyCall;
pub use error::{VerifyError, VerifyResult};
pub use verifier::{Availability, RemoteVerifier, Validity};
