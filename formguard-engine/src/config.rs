//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::registry::AsyncRule;

/// Debounce delays per async rule kind, an optional check timeout and
/// internal channel sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Debounce before a username availability check (ms).
    pub username_debounce_ms: u64,
    /// Debounce before an email availability check (ms).
    pub email_debounce_ms: u64,
    /// Debounce before an email domain check (ms).
    pub domain_debounce_ms: u64,
    /// Debounce before a remote zip check (ms).
    pub zip_debounce_ms: u64,
    /// Debounce before a business rule check (ms).
    pub business_debounce_ms: u64,
    /// A remote check that takes longer than this is inconclusive (ms).
    /// `None` waits forever.
    pub check_timeout_ms: Option<u64>,
    /// Capacity of the channel timers and remote calls report into.
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            username_debounce_ms: 500,
            email_debounce_ms: 500,
            domain_debounce_ms: 300,
            zip_debounce_ms: 400,
            business_debounce_ms: 300,
            check_timeout_ms: None,
            event_buffer: 64,
        }
    }
}

impl EngineConfig {
    /// Loads a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The debounce delay for an async rule.
    #[must_use]
    pub fn debounce_for(&self, rule: &AsyncRule) -> Duration {
        let ms = match rule {
            AsyncRule::UsernameAvailable => self.username_debounce_ms,
            AsyncRule::EmailAvailable => self.email_debounce_ms,
            AsyncRule::EmailDomain => self.domain_debounce_ms,
            AsyncRule::ZipCode { .. } => self.zip_debounce_ms,
            AsyncRule::BusinessRule { .. } => self.business_debounce_ms,
        };
        Duration::from_millis(ms)
    }

    #[must_use]
    pub fn check_timeout(&self) -> Option<Duration> {
        self.check_timeout_ms.map(Duration::from_millis)
    }
}
