//! The aggregate validation result handed to the field-tree host.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{ErrorEntry, ErrorKind, FieldPath, RuleKind};

/// Immutable view of every field's errors plus the checks still running.
///
/// A new snapshot replaces the previous one as a whole. Two snapshots of an
/// unchanged tree compare equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSnapshot {
    errors: BTreeMap<FieldPath, Vec<ErrorEntry>>,
    pending: BTreeMap<FieldPath, BTreeSet<RuleKind>>,
}

impl ValidationSnapshot {
    /// Builds a snapshot. Fields with no entries or no pending checks are dropped.
    pub fn new(
        errors: BTreeMap<FieldPath, Vec<ErrorEntry>>,
        pending: BTreeMap<FieldPath, BTreeSet<RuleKind>>,
    ) -> Self {
        Self {
            errors: errors.into_iter().filter(|(_, e)| !e.is_empty()).collect(),
            pending: pending.into_iter().filter(|(_, p)| !p.is_empty()).collect(),
        }
    }

    /// True iff no field has entries and no async check is pending.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.pending.is_empty()
    }

    /// Whether the field itself carries any entry.
    #[must_use]
    pub fn is_field_invalid(&self, path: &FieldPath) -> bool {
        self.errors.contains_key(path)
    }

    /// Entries for a field in rule registration order.
    #[must_use]
    pub fn errors_for(&self, path: &FieldPath) -> &[ErrorEntry] {
        self.errors.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// The entry of the given kind on a field, if any.
    #[must_use]
    pub fn entry(&self, path: &FieldPath, kind: &ErrorKind) -> Option<&ErrorEntry> {
        self.errors_for(path).iter().find(|e| &e.kind == kind)
    }

    #[must_use]
    pub fn has_error(&self, path: &FieldPath, kind: &ErrorKind) -> bool {
        self.entry(path, kind).is_some()
    }

    /// All fields with at least one entry.
    pub fn invalid_fields(&self) -> impl Iterator<Item = &FieldPath> {
        self.errors.keys()
    }

    /// All entries, grouped by field.
    #[must_use]
    pub fn errors(&self) -> &BTreeMap<FieldPath, Vec<ErrorEntry>> {
        &self.errors
    }

    /// Total number of entries across fields.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Whether any check for this field is debouncing or in flight.
    #[must_use]
    pub fn is_pending(&self, path: &FieldPath) -> bool {
        self.pending.contains_key(path)
    }

    /// Rule kinds with a check outstanding on this field.
    pub fn pending_for(&self, path: &FieldPath) -> impl Iterator<Item = &RuleKind> {
        self.pending.get(path).into_iter().flatten()
    }

    /// Total number of outstanding checks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(BTreeSet::len).sum()
    }
}
