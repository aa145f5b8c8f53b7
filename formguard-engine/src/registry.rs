//! Rule registration and dependency resolution.
//!
//! Rules are registered once, in order, and never change afterwards. The
//! registration index doubles as the rule's id and fixes the order in which
//! rules run and in which a field's entries are reported.

use formguard_rules::{Failure, RuleContext, SyncRule};
use formguard_types::{ErrorKind, ErrorPayload, FieldPath, FieldValue, RuleKind};
use formguard_verify::VerifyCall;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::info;

use crate::error::{RegistryError, RegistryResult};

/// Index of a rule in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(usize);

impl RuleId {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// A rule evaluated by the remote verification service.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncRule {
    UsernameAvailable,
    EmailAvailable,
    /// Checks the part after the first `@`.
    EmailDomain,
    /// Remote zip validity for the country held in `country`.
    ZipCode { country: FieldPath },
    /// A named domain rule; a negative answer raises `error_kind`.
    BusinessRule { name: String, error_kind: ErrorKind },
}

impl AsyncRule {
    /// A business rule raising a custom error kind.
    pub fn business(name: impl Into<String>, error_kind: impl Into<String>) -> Self {
        Self::BusinessRule {
            name: name.into(),
            error_kind: ErrorKind::from(error_kind.into()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::UsernameAvailable => RuleKind::UsernameAvailable,
            Self::EmailAvailable => RuleKind::EmailAvailable,
            Self::EmailDomain => RuleKind::EmailDomain,
            Self::ZipCode { .. } => RuleKind::ZipCodeValid,
            Self::BusinessRule { name, .. } => RuleKind::BusinessRule(name.clone()),
        }
    }

    #[must_use]
    pub fn depends_on(&self) -> Vec<FieldPath> {
        match self {
            Self::ZipCode { country } => vec![country.clone()],
            _ => Vec::new(),
        }
    }

    /// The remote call for the current value, or `None` when there is
    /// nothing to check (empty value, no domain, no country).
    #[must_use]
    pub fn request(&self, value: &FieldValue, ctx: &RuleContext<'_>) -> Option<VerifyCall> {
        let text = value.to_text().filter(|t| !t.is_empty())?;
        match self {
            Self::UsernameAvailable => Some(VerifyCall::Username { name: text }),
            Self::EmailAvailable => Some(VerifyCall::Email { email: text }),
            Self::EmailDomain => {
                let (_, domain) = text.split_once('@')?;
                (!domain.is_empty()).then(|| VerifyCall::Domain {
                    domain: domain.to_string(),
                })
            }
            Self::ZipCode { country } => {
                let country = ctx.sibling(country).to_text().filter(|c| !c.is_empty())?;
                Some(VerifyCall::Zip { zip: text, country })
            }
            Self::BusinessRule { name, .. } => Some(VerifyCall::BusinessRule {
                rule: name.clone(),
                value: text,
            }),
        }
    }

    /// The failure raised when the service answers negatively to `call`.
    #[must_use]
    pub fn failure(&self, call: &VerifyCall) -> Failure {
        match (self, call) {
            (Self::UsernameAvailable, _) => Failure::bare(ErrorKind::UsernameTaken),
            (Self::EmailAvailable, _) => Failure::bare(ErrorKind::EmailTaken),
            (Self::EmailDomain, VerifyCall::Domain { domain }) => Failure::with(
                ErrorKind::InvalidDomain,
                ErrorPayload::Domain {
                    domain: domain.clone(),
                },
            ),
            (Self::EmailDomain, _) => Failure::bare(ErrorKind::InvalidDomain),
            (Self::ZipCode { .. }, VerifyCall::Zip { country, .. }) => Failure::with(
                ErrorKind::InvalidZipCode,
                ErrorPayload::Country {
                    country: country.clone(),
                },
            ),
            (Self::ZipCode { .. }, _) => Failure::bare(ErrorKind::InvalidZipCode),
            (Self::BusinessRule { error_kind, .. }, _) => Failure::bare(error_kind.clone()),
        }
    }
}

/// How a rule is evaluated.
#[derive(Debug, Clone)]
pub enum RuleCheck {
    Sync(SyncRule),
    Async(AsyncRule),
}

impl From<SyncRule> for RuleCheck {
    fn from(rule: SyncRule) -> Self {
        Self::Sync(rule)
    }
}

impl From<AsyncRule> for RuleCheck {
    fn from(rule: AsyncRule) -> Self {
        Self::Async(rule)
    }
}

/// A rule bound to a field.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    pub field: FieldPath,
    pub kind: RuleKind,
    pub check: RuleCheck,
    pub depends_on: Vec<FieldPath>,
}

impl Rule {
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self.check, RuleCheck::Async(_))
    }
}

/// Collects rule registrations; [`RuleRegistryBuilder::build`] validates them.
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    pending: Vec<(String, RuleCheck)>,
}

impl RuleRegistryBuilder {
    /// Binds a rule to the field at `path`.
    pub fn rule(mut self, path: &str, check: impl Into<RuleCheck>) -> Self {
        self.pending.push((path.to_string(), check.into()));
        self
    }

    pub fn sync(self, path: &str, rule: SyncRule) -> Self {
        self.rule(path, rule)
    }

    pub fn remote(self, path: &str, rule: AsyncRule) -> Self {
        self.rule(path, rule)
    }

    /// Validates every registration and freezes the registry.
    pub fn build(self) -> RegistryResult<RuleRegistry> {
        let mut rules = Vec::with_capacity(self.pending.len());
        let mut seen: HashSet<(FieldPath, RuleKind)> = HashSet::new();

        for (index, (path, check)) in self.pending.into_iter().enumerate() {
            let field =
                FieldPath::parse(&path).map_err(|_| RegistryError::InvalidPath(path.clone()))?;
            let (kind, mut depends_on) = match &check {
                RuleCheck::Sync(rule) => (rule.kind(), rule.depends_on()),
                RuleCheck::Async(rule) => (rule.kind(), rule.depends_on()),
            };
            let mut unique = HashSet::new();
            depends_on.retain(|dep| unique.insert(dep.clone()));

            if depends_on.contains(&field) {
                return Err(RegistryError::SelfDependency { field, rule: kind });
            }
            if !seen.insert((field.clone(), kind.clone())) {
                return Err(RegistryError::DuplicateRule { field, rule: kind });
            }

            rules.push(Rule {
                id: RuleId(index),
                field,
                kind,
                check,
                depends_on,
            });
        }

        if let Some(cycle) = find_cycle(&rules) {
            return Err(RegistryError::CyclicDependency { cycle });
        }

        let mut own: HashMap<FieldPath, Vec<RuleId>> = HashMap::new();
        let mut dependents: HashMap<FieldPath, Vec<RuleId>> = HashMap::new();
        for rule in &rules {
            own.entry(rule.field.clone()).or_default().push(rule.id);
            for dep in &rule.depends_on {
                dependents.entry(dep.clone()).or_default().push(rule.id);
            }
        }

        info!(
            "rule registry built: {} rules ({} async) on {} fields",
            rules.len(),
            rules.iter().filter(|r| r.is_async()).count(),
            own.len()
        );

        Ok(RuleRegistry {
            rules,
            own,
            dependents,
        })
    }
}

/// Edges run from a dependency to the field whose rule reads it. Fields are
/// visited in sorted order so the reported cycle is deterministic.
fn find_cycle(rules: &[Rule]) -> Option<Vec<FieldPath>> {
    let mut edges: BTreeMap<&FieldPath, BTreeSet<&FieldPath>> = BTreeMap::new();
    for rule in rules {
        for dep in &rule.depends_on {
            edges.entry(dep).or_default().insert(&rule.field);
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a FieldPath,
        edges: &BTreeMap<&'a FieldPath, BTreeSet<&'a FieldPath>>,
        marks: &mut HashMap<&'a FieldPath, Mark>,
        stack: &mut Vec<&'a FieldPath>,
    ) -> Option<Vec<FieldPath>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<FieldPath> = stack[start..].iter().map(|p| (*p).clone()).collect();
                cycle.push(node.clone());
                return Some(cycle);
            }
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        if let Some(next) = edges.get(node) {
            for target in next {
                if let Some(cycle) = visit(target, edges, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    for node in edges.keys() {
        if let Some(cycle) = visit(node, &edges, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

/// The frozen set of rules with their dependency index.
#[derive(Debug)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    own: HashMap<FieldPath, Vec<RuleId>>,
    dependents: HashMap<FieldPath, Vec<RuleId>>,
}

impl RuleRegistry {
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::default()
    }

    /// All rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    /// Rules bound to `field`, in registration order.
    pub fn rules_for<'a>(&'a self, field: &FieldPath) -> impl Iterator<Item = &'a Rule> + 'a {
        self.ids(&self.own, field)
    }

    /// Rules on other fields that read `field`, in registration order.
    pub fn dependents_of<'a>(&'a self, field: &FieldPath) -> impl Iterator<Item = &'a Rule> + 'a {
        self.ids(&self.dependents, field)
    }

    fn ids<'a>(
        &'a self,
        index: &'a HashMap<FieldPath, Vec<RuleId>>,
        field: &FieldPath,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        index
            .get(field)
            .into_iter()
            .flatten()
            .filter_map(|id| self.rules.get(id.0))
    }

    /// Rules to evaluate after `changed` got a new value: its own rules,
    /// then every dependent rule elsewhere. Dependents of those dependents
    /// are not included.
    #[must_use]
    pub fn plan(&self, changed: &FieldPath) -> Vec<&Rule> {
        self.rules_for(changed)
            .chain(self.dependents_of(changed))
            .collect()
    }

    /// Every field that has at least one rule.
    pub fn fields(&self) -> impl Iterator<Item = &FieldPath> {
        self.own.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
