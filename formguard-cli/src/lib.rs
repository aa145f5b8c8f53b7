//! Library side of the `formguard` binary.
//!
//! Loads a registration form document, runs it through the validation
//! engine against the in-memory verifier and reports what a user would see
//! after pressing submit.

pub mod form;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use formguard_engine::{EngineConfig, FieldHost, FixedClock, ValidationEngine};
use formguard_types::FieldValue;
use formguard_verify::RemoteVerifier;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of validating one form document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormReport {
    pub valid: bool,
    /// Messages per invalid field, keyed by path.
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Reads an [`EngineConfig`] from a JSON file.
pub fn read_config(path: &Path) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Reads a form document from a JSON file.
pub fn read_form(path: &Path) -> Result<JsonValue> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Feeds every field of `doc` through the registration rules, waits for
/// all remote checks and forces every field touched.
pub async fn validate_form(
    doc: &JsonValue,
    config: EngineConfig,
    today: NaiveDate,
    verifier: Arc<dyn RemoteVerifier>,
) -> Result<FormReport> {
    let registry = form::registration_rules().context("registration rules rejected")?;
    let tree = form::load_form(doc).context("malformed form document")?;
    let mut engine =
        ValidationEngine::with_clock(registry, tree, verifier, config, Arc::new(FixedClock(today)));

    let paths = engine.host().field_paths();
    info!("validating {} fields as of {}", paths.len(), today);
    for path in &paths {
        let value = engine.value(path).cloned().unwrap_or(FieldValue::Empty);
        engine.on_value_changed(path, value)?;
    }
    engine.settle().await?;
    engine.force_touch_all();

    let mut errors = BTreeMap::new();
    for path in &paths {
        if engine.should_show_error(path) {
            errors.insert(path.to_string(), engine.messages(path));
        }
    }
    debug!("{} invalid fields", errors.len());

    Ok(FormReport {
        valid: engine.can_submit(),
        errors,
    })
}
