//! Per-field error entries, owned by the rule that produced them.

use formguard_rules::Failure;
use formguard_types::{ErrorEntry, ErrorKind, FieldPath};
use std::collections::{BTreeMap, HashSet};

use crate::registry::{Rule, RuleId};

/// The engine's record of failing rules.
///
/// Each rule owns at most one entry on its field. A rule that passes clears
/// its entry; nothing else does, so an entry raised through a dependency is
/// removed by the same rule once the dependency is satisfied again.
#[derive(Debug, Default)]
pub struct ErrorBook {
    entries: BTreeMap<FieldPath, BTreeMap<RuleId, ErrorEntry>>,
}

impl ErrorBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the outcome of one rule evaluation. Returns whether the book
    /// changed.
    pub fn record(&mut self, rule: &Rule, outcome: Option<Failure>, generation: u64) -> bool {
        match outcome {
            Some(failure) => self.set(rule, failure, generation),
            None => self.clear(rule),
        }
    }

    /// Stores a failure for `rule`. An identical entry is kept as is, along
    /// with the generation it was first produced at.
    pub fn set(&mut self, rule: &Rule, failure: Failure, generation: u64) -> bool {
        let entry = ErrorEntry::new(
            rule.field.clone(),
            failure.kind,
            failure.payload,
            rule.kind.clone(),
            generation,
        );
        let slot = self.entries.entry(rule.field.clone()).or_default();
        if slot.get(&rule.id).is_some_and(|e| e.same_failure(&entry)) {
            return false;
        }
        slot.insert(rule.id, entry);
        true
    }

    /// Removes `rule`'s entry, if any.
    pub fn clear(&mut self, rule: &Rule) -> bool {
        let Some(slot) = self.entries.get_mut(&rule.field) else {
            return false;
        };
        let removed = slot.remove(&rule.id).is_some();
        if slot.is_empty() {
            self.entries.remove(&rule.field);
        }
        removed
    }

    /// Removes every entry on `field` and on fields nested under it.
    pub fn clear_field(&mut self, field: &FieldPath) -> bool {
        let before = self.entries.len();
        self.entries.retain(|path, _| !path.starts_with(field));
        before != self.entries.len()
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Entries for `field` in rule registration order.
    pub fn entries_for<'a>(&'a self, field: &FieldPath) -> impl Iterator<Item = &'a ErrorEntry> + 'a {
        self.entries.get(field).into_iter().flat_map(BTreeMap::values)
    }

    /// Per-field entry lists for a snapshot. When two rules on a field fail
    /// with the same kind, the earlier-registered rule's entry is reported.
    #[must_use]
    pub fn to_errors(&self) -> BTreeMap<FieldPath, Vec<ErrorEntry>> {
        self.entries
            .iter()
            .map(|(path, slot)| {
                let mut seen: HashSet<&ErrorKind> = HashSet::new();
                let list = slot
                    .values()
                    .filter(|e| seen.insert(&e.kind))
                    .cloned()
                    .collect();
                (path.clone(), list)
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
