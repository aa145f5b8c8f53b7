use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VerifyResult;
use crate::verifier::RemoteVerifier;

/// One remote check, fully described by its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum VerifyCall {
    Username { name: String },
    Email { email: String },
    Domain { domain: String },
    Zip { zip: String, country: String },
    BusinessRule { rule: String, value: String },
}

impl VerifyCall {
    /// Runs the call. `Ok(true)` means the value passed.
    pub async fn dispatch(&self, verifier: &dyn RemoteVerifier) -> VerifyResult<bool> {
        match self {
            Self::Username { name } => Ok(verifier.check_username(name).await?.available),
            Self::Email { email } => Ok(verifier.check_email(email).await?.available),
            Self::Domain { domain } => Ok(verifier.check_domain(domain).await?.valid),
            Self::Zip { zip, country } => Ok(verifier.check_zip(zip, country).await?.valid),
            Self::BusinessRule { rule, value } => verifier.check_business_rule(rule, value).await,
        }
    }

    /// The value under test, used for log lines and latency lookup.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::Username { name } => name,
            Self::Email { email } => email,
            Self::Domain { domain } => domain,
            Self::Zip { zip, .. } => zip,
            Self::BusinessRule { value, .. } => value,
        }
    }
}

impl fmt::Display for VerifyCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username { name } => write!(f, "username({name})"),
            Self::Email { email } => write!(f, "email({email})"),
            Self::Domain { domain } => write!(f, "domain({domain})"),
            Self::Zip { zip, country } => write!(f, "zip({zip}, {country})"),
            Self::BusinessRule { rule, value } => write!(f, "{rule}({value})"),
        }
    }
}
