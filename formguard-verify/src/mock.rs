//! An in-memory verifier for tests, demos and the CLI.
//!
//! Ships with a small table of taken usernames and emails and a list of
//! domains that do not accept mail. Latency, failures and business rules
//! are configurable per instance, and every call is logged.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::call::VerifyCall;
use crate::error::{VerifyError, VerifyResult};
use crate::verifier::{Availability, RemoteVerifier, Validity};

type BusinessFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Canned verification service.
pub struct InMemoryVerifier {
    taken_usernames: HashSet<String>,
    taken_emails: HashSet<String>,
    invalid_domains: HashSet<String>,
    business_rules: HashMap<String, BusinessFn>,
    latency: Duration,
    latency_overrides: HashMap<String, Duration>,
    failing: HashSet<String>,
    fail_all: bool,
    calls: Mutex<Vec<VerifyCall>>,
}

impl Default for InMemoryVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVerifier {
    /// A verifier with the canned data and no latency.
    pub fn new() -> Self {
        let set = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<HashSet<_>>();
        Self {
            taken_usernames: set(&["john_doe", "jane_smith", "admin", "user123"]),
            taken_emails: set(&["john@example.com", "jane@example.com", "admin@test.com"]),
            invalid_domains: set(&["fake.com", "test123.com", "invalid.net"]),
            business_rules: HashMap::new(),
            latency: Duration::ZERO,
            latency_overrides: HashMap::new(),
            failing: HashSet::new(),
            fail_all: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delays every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Overrides the latency for calls whose subject equals `value`.
    pub fn with_latency_for(mut self, value: impl Into<String>, latency: Duration) -> Self {
        self.latency_overrides.insert(value.into(), latency);
        self
    }

    /// Calls whose subject equals `value` fail with a network error.
    pub fn failing_for(mut self, value: impl Into<String>) -> Self {
        self.failing.insert(value.into());
        self
    }

    /// Every call fails with [`VerifyError::Unavailable`].
    pub fn failing_always(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn with_taken_username(mut self, name: impl Into<String>) -> Self {
        self.taken_usernames.insert(name.into().to_lowercase());
        self
    }

    /// Registers a business rule; `check` returns `true` when the value passes.
    pub fn with_business_rule(
        mut self,
        rule: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.business_rules.insert(rule.into(), Arc::new(check));
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<VerifyCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn respond(&self, call: VerifyCall) -> VerifyResult<()> {
        debug!("in-memory verifier received {}", call);
        let latency = self
            .latency_overrides
            .get(call.subject())
            .copied()
            .unwrap_or(self.latency);
        let fails = self.fail_all || self.failing.contains(call.subject());
        let subject = call.subject().to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.fail_all {
            return Err(VerifyError::Unavailable);
        }
        if fails {
            return Err(VerifyError::Network(format!("connection reset while checking {subject}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteVerifier for InMemoryVerifier {
    async fn check_username(&self, name: &str) -> VerifyResult<Availability> {
        self.respond(VerifyCall::Username {
            name: name.to_string(),
        })
        .await?;
        Ok(Availability {
            available: !self.taken_usernames.contains(&name.to_lowercase()),
        })
    }

    async fn check_email(&self, email: &str) -> VerifyResult<Availability> {
        self.respond(VerifyCall::Email {
            email: email.to_string(),
        })
        .await?;
        Ok(Availability {
            available: !self.taken_emails.contains(&email.to_lowercase()),
        })
    }

    async fn check_domain(&self, domain: &str) -> VerifyResult<Validity> {
        self.respond(VerifyCall::Domain {
            domain: domain.to_string(),
        })
        .await?;
        Ok(Validity {
            valid: !self.invalid_domains.contains(&domain.to_lowercase()),
        })
    }

    async fn check_zip(&self, zip: &str, country: &str) -> VerifyResult<Validity> {
        self.respond(VerifyCall::Zip {
            zip: zip.to_string(),
            country: country.to_string(),
        })
        .await?;
        Ok(Validity {
            valid: zip.chars().count() >= 5,
        })
    }

    async fn check_business_rule(&self, rule: &str, value: &str) -> VerifyResult<bool> {
        self.respond(VerifyCall::BusinessRule {
            rule: rule.to_string(),
            value: value.to_string(),
        })
        .await?;
        match self.business_rules.get(rule) {
            Some(check) => Ok(check(value)),
            None => Err(VerifyError::Unsupported(rule.to_string())),
        }
    }
}
