//! Per-country postal code formats.
//!
//! Countries without a registered format are not validated at all: a zip
//! code for an unknown country is accepted as-is.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{RuleError, RuleResult};

static BUILTIN: LazyLock<ZipTable> = LazyLock::new(|| {
    let mut table = ZipTable::empty();
    for (country, pattern) in [
        ("US", r"\d{5}(-\d{4})?"),
        ("CA", r"[A-Z]\d[A-Z] \d[A-Z]\d"),
        ("UK", r"[A-Z]{1,2}\d{1,2} \d[A-Z]{2}"),
        ("DE", r"\d{5}"),
        ("FR", r"\d{5}"),
        ("AU", r"\d{4}"),
        ("JP", r"\d{3}-\d{4}"),
    ] {
        table = table
            .with(country, pattern)
            .expect("builtin zip patterns are valid");
    }
    table
});

/// Country code to anchored postal code pattern.
#[derive(Debug, Clone, Default)]
pub struct ZipTable {
    patterns: HashMap<String, Regex>,
}

impl ZipTable {
    /// A table with no countries.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The builtin table: US, CA, UK, DE, FR, AU, JP.
    #[must_use]
    pub fn builtin() -> &'static ZipTable {
        &BUILTIN
    }

    /// Registers (or replaces) a country's format. The pattern must match
    /// the whole zip code.
    pub fn with(mut self, country: &str, pattern: &str) -> RuleResult<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        self.patterns.insert(country.to_string(), anchored);
        Ok(self)
    }

    /// Whether the country has a registered format.
    #[must_use]
    pub fn knows(&self, country: &str) -> bool {
        self.patterns.contains_key(country)
    }

    /// `Some(true|false)` for known countries, `None` when there is nothing to check against.
    #[must_use]
    pub fn matches(&self, country: &str, zip: &str) -> Option<bool> {
        self.patterns.get(country).map(|re| re.is_match(zip))
    }

    /// Registered country codes, sorted.
    #[must_use]
    pub fn countries(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
