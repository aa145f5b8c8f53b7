//! Debounce / in-flight state machine for remote checks.
//!
//! One state per (field, rule) pair:
//!
//! ```text
//!   Idle ──schedule──▶ Debouncing ──fire──▶ InFlight ──resolve──▶ Idle
//!              ▲           │  ▲                │
//!              │           └──┘ schedule       │ schedule
//!              └──── cancel ───────────────────┘
//! ```
//!
//! Every transition mints a fresh [`CheckToken`]. Timer and result events
//! carry the token they were started with and are ignored unless it is still
//! the current one, so a superseded timer or a slow response can never write
//! a result. The pipeline does no I/O itself; it hands back
//! [`PipelineCommand`]s for the driver to carry out.

use formguard_types::{CheckToken, FieldPath, PendingCheck, RuleKind};
use formguard_verify::VerifyCall;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::registry::RuleId;

/// Identifies one remote check slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckKey {
    pub field: FieldPath,
    pub rule: RuleId,
}

impl CheckKey {
    pub fn new(field: FieldPath, rule: RuleId) -> Self {
        Self { field, rule }
    }
}

impl fmt::Display for CheckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.field, self.rule)
    }
}

/// Externally visible state of a check slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Idle,
    Debouncing,
    InFlight,
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineCommand {
    /// Start (or restart) the debounce timer; report back with `token`.
    Arm {
        key: CheckKey,
        token: CheckToken,
        delay: Duration,
    },
    /// Issue the remote call; report the outcome with `token`.
    Issue {
        key: CheckKey,
        token: CheckToken,
        call: VerifyCall,
    },
    /// Drop whatever timer or call is running for `key`.
    Cancel { key: CheckKey },
}

impl PipelineCommand {
    #[must_use]
    pub fn key(&self) -> &CheckKey {
        match self {
            Self::Arm { key, .. } | Self::Issue { key, .. } | Self::Cancel { key } => key,
        }
    }
}

#[derive(Debug)]
enum CheckState {
    Debouncing {
        token: CheckToken,
        kind: RuleKind,
        call: VerifyCall,
    },
    InFlight {
        pending: PendingCheck,
        call: VerifyCall,
    },
}

impl CheckState {
    fn token(&self) -> CheckToken {
        match self {
            Self::Debouncing { token, .. } => *token,
            Self::InFlight { pending, .. } => pending.token,
        }
    }

    fn kind(&self) -> &RuleKind {
        match self {
            Self::Debouncing { kind, .. } => kind,
            Self::InFlight { pending, .. } => &pending.rule_kind,
        }
    }
}

/// All outstanding remote checks of one engine.
#[derive(Debug, Default)]
pub struct AsyncPipeline {
    states: HashMap<CheckKey, CheckState>,
    last_token: CheckToken,
}

impl AsyncPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self) -> CheckToken {
        self.last_token = self.last_token.next();
        self.last_token
    }

    /// A change arrived: (re)start the debounce for `key` with the call to
    /// make once it settles. Supersedes any timer or call already running.
    pub fn schedule(
        &mut self,
        key: CheckKey,
        kind: RuleKind,
        call: VerifyCall,
        delay: Duration,
    ) -> PipelineCommand {
        let token = self.mint();
        if let Some(prev) = self.states.get(&key) {
            debug!("superseding {} check {} on {}", prev.kind(), prev.token(), key.field);
        }
        debug!(
            "debouncing {} on {} for {:?} ({})",
            kind, key.field, delay, token
        );
        self.states
            .insert(key.clone(), CheckState::Debouncing { token, kind, call });
        PipelineCommand::Arm { key, token, delay }
    }

    /// Returns the slot to idle. `None` when it already was.
    pub fn cancel(&mut self, key: &CheckKey) -> Option<PipelineCommand> {
        let state = self.states.remove(key)?;
        debug!("cancelled {} check {} on {}", state.kind(), state.token(), key.field);
        Some(PipelineCommand::Cancel { key: key.clone() })
    }

    /// Cancels every check on `field` and on fields nested under it.
    pub fn cancel_field(&mut self, field: &FieldPath) -> Vec<PipelineCommand> {
        let mut keys: Vec<CheckKey> = self
            .states
            .keys()
            .filter(|k| k.field.starts_with(field))
            .cloned()
            .collect();
        keys.sort();
        keys.iter().filter_map(|k| self.cancel(k)).collect()
    }

    /// Cancels everything.
    pub fn clear(&mut self) -> Vec<PipelineCommand> {
        let mut keys: Vec<CheckKey> = self.states.keys().cloned().collect();
        keys.sort();
        keys.iter().filter_map(|k| self.cancel(k)).collect()
    }

    /// The debounce timer for `key` elapsed. Moves the slot in flight under a
    /// fresh token, unless the timer was superseded.
    pub fn fire(&mut self, key: &CheckKey, token: CheckToken) -> Option<PipelineCommand> {
        match self.states.get(key) {
            Some(CheckState::Debouncing { token: current, .. }) if *current == token => {}
            _ => {
                debug!("ignoring stale timer {} for {}", token, key);
                return None;
            }
        }
        let Some(CheckState::Debouncing { kind, call, .. }) = self.states.remove(key) else {
            return None;
        };
        let issued = self.mint();
        debug!("issuing {} for {} ({})", call, key.field, issued);
        self.states.insert(
            key.clone(),
            CheckState::InFlight {
                pending: PendingCheck::start(key.field.clone(), kind, issued),
                call: call.clone(),
            },
        );
        Some(PipelineCommand::Issue {
            key: key.clone(),
            token: issued,
            call,
        })
    }

    /// A remote call completed. Returns the call that was made when `token`
    /// is the one currently in flight for `key`, and returns the slot to
    /// idle. Stale completions yield `None` and change nothing.
    pub fn resolve(&mut self, key: &CheckKey, token: CheckToken) -> Option<VerifyCall> {
        match self.states.get(key) {
            Some(CheckState::InFlight { pending, .. }) if pending.token == token => {}
            _ => {
                debug!("discarding stale result {} for {}", token, key);
                return None;
            }
        }
        match self.states.remove(key) {
            Some(CheckState::InFlight { pending, call }) => {
                debug!(
                    "{} resolved after {:?}",
                    call,
                    pending.started_at.elapsed()
                );
                Some(call)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self, key: &CheckKey) -> CheckPhase {
        match self.states.get(key) {
            None => CheckPhase::Idle,
            Some(CheckState::Debouncing { .. }) => CheckPhase::Debouncing,
            Some(CheckState::InFlight { .. }) => CheckPhase::InFlight,
        }
    }

    /// The in-flight record for `key`, if a call is outstanding.
    #[must_use]
    pub fn in_flight(&self, key: &CheckKey) -> Option<&PendingCheck> {
        match self.states.get(key) {
            Some(CheckState::InFlight { pending, .. }) => Some(pending),
            _ => None,
        }
    }

    /// The token a timer or result for `key` must carry to be accepted.
    #[must_use]
    pub fn current_token(&self, key: &CheckKey) -> Option<CheckToken> {
        self.states.get(key).map(CheckState::token)
    }

    /// Rule kinds with a check debouncing or in flight, per field.
    #[must_use]
    pub fn pending(&self) -> BTreeMap<FieldPath, BTreeSet<RuleKind>> {
        let mut out: BTreeMap<FieldPath, BTreeSet<RuleKind>> = BTreeMap::new();
        for (key, state) in &self.states {
            out.entry(key.field.clone())
                .or_default()
                .insert(state.kind().clone());
        }
        out
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.states.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
