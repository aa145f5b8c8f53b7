use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{VerifyError, VerifyResult};

/// Answer to an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
}

/// Answer to a validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub valid: bool,
}

/// The remote checks async rules depend on.
#[async_trait]
pub trait RemoteVerifier: Send + Sync {
    /// Whether a username is still free.
    async fn check_username(&self, name: &str) -> VerifyResult<Availability>;

    /// Whether an email address is not yet registered.
    async fn check_email(&self, email: &str) -> VerifyResult<Availability>;

    /// Whether a mail domain exists and accepts mail.
    async fn check_domain(&self, domain: &str) -> VerifyResult<Validity>;

    /// Whether a zip code exists in the given country.
    async fn check_zip(&self, zip: &str, country: &str) -> VerifyResult<Validity>;

    /// A named domain-specific rule. `true` means the value passes.
    ///
    /// The default rejects every rule as unsupported, which the engine
    /// treats as inconclusive.
    async fn check_business_rule(&self, rule: &str, value: &str) -> VerifyResult<bool> {
        let _ = value;
        Err(VerifyError::Unsupported(rule.to_string()))
    }
}
