//! The synchronous validation core.
//!
//! [`Validator`] owns the rule registry, the error book and the async
//! pipeline. It reacts to one event at a time and never awaits: remote work
//! comes back as [`PipelineCommand`]s for the driver to run. Tests drive it
//! directly to step through debounce and resolution orderings by hand.

use formguard_rules::{RuleContext, ValueSource};
use formguard_types::{CheckToken, FieldPath, RuleKind, ValidationSnapshot};
use formguard_verify::VerifyResult;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::book::ErrorBook;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::pipeline::{AsyncPipeline, CheckKey, CheckPhase, PipelineCommand};
use crate::registry::{AsyncRule, Rule, RuleCheck, RuleRegistry};

/// Rule evaluation, error bookkeeping and check scheduling for one tree.
pub struct Validator {
    registry: Arc<RuleRegistry>,
    book: ErrorBook,
    pipeline: AsyncPipeline,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    generation: u64,
}

impl Validator {
    pub fn new(registry: RuleRegistry, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: Arc::new(registry),
            book: ErrorBook::new(),
            pipeline: AsyncPipeline::new(),
            config,
            clock,
            generation: 0,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of events processed so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `path` has a new value in `values`. Runs every affected sync rule,
    /// then schedules the affected async rules. Sync results are in the book
    /// before any async rule is looked at.
    pub fn value_changed(&mut self, values: &dyn ValueSource, path: &FieldPath) -> Vec<PipelineCommand> {
        self.generation += 1;
        let registry = Arc::clone(&self.registry);
        let plan = registry.plan(path);
        debug!("{} changed: {} rules to evaluate", path, plan.len());

        let ctx = RuleContext::new(values, self.clock.today());
        for rule in &plan {
            self.run_sync(rule, &ctx);
        }
        plan.iter()
            .filter_map(|rule| self.schedule(rule, &ctx))
            .collect()
    }

    /// Re-runs every sync rule against current values. Remote checks are
    /// left alone, so on an unchanged tree the snapshot stays equal.
    pub fn revalidate(&mut self, values: &dyn ValueSource) {
        self.generation += 1;
        let registry = Arc::clone(&self.registry);
        let ctx = RuleContext::new(values, self.clock.today());
        for rule in registry.rules() {
            self.run_sync(rule, &ctx);
        }
    }

    /// Re-runs every rule, scheduling every remote check afresh.
    pub fn validate_all(&mut self, values: &dyn ValueSource) -> Vec<PipelineCommand> {
        self.revalidate(values);
        let registry = Arc::clone(&self.registry);
        let ctx = RuleContext::new(values, self.clock.today());
        registry
            .rules()
            .iter()
            .filter_map(|rule| self.schedule(rule, &ctx))
            .collect()
    }

    fn run_sync(&mut self, rule: &Rule, ctx: &RuleContext<'_>) {
        let RuleCheck::Sync(check) = &rule.check else {
            return;
        };
        let outcome = check.evaluate(ctx.sibling(&rule.field), ctx);
        self.book.record(rule, outcome, self.generation);
    }

    fn schedule(&mut self, rule: &Rule, ctx: &RuleContext<'_>) -> Option<PipelineCommand> {
        let RuleCheck::Async(check) = &rule.check else {
            return None;
        };
        let key = CheckKey::new(rule.field.clone(), rule.id);
        match check.request(ctx.sibling(&rule.field), ctx) {
            Some(call) => {
                let delay = self.config.debounce_for(check);
                Some(self.pipeline.schedule(key, rule.kind.clone(), call, delay))
            }
            None => {
                self.book.clear(rule);
                self.pipeline.cancel(&key)
            }
        }
    }

    /// The debounce timer for `key` elapsed.
    pub fn timer_fired(&mut self, key: &CheckKey, token: CheckToken) -> Option<PipelineCommand> {
        self.pipeline.fire(key, token)
    }

    /// A remote call completed. Returns whether the outcome was applied.
    ///
    /// `Ok(false)` raises the rule's error. A verifier error is inconclusive:
    /// it clears the rule's entry like a pass would.
    pub fn check_resolved(
        &mut self,
        key: &CheckKey,
        token: CheckToken,
        outcome: VerifyResult<bool>,
    ) -> bool {
        let Some(call) = self.pipeline.resolve(key, token) else {
            return false;
        };
        let registry = Arc::clone(&self.registry);
        let Some((rule, check)) = registry.get(key.rule).and_then(async_check) else {
            return false;
        };
        self.generation += 1;
        match outcome {
            Ok(true) => {
                self.book.clear(rule);
            }
            Ok(false) => {
                self.book.set(rule, check.failure(&call), self.generation);
            }
            Err(e) => {
                warn!("{} on {} inconclusive: {}", call, key.field, e);
                self.book.clear(rule);
            }
        }
        true
    }

    /// Forgets `path` and everything beneath it: errors and remote checks.
    pub fn field_removed(&mut self, path: &FieldPath) -> Vec<PipelineCommand> {
        self.generation += 1;
        self.book.clear_field(path);
        self.pipeline.cancel_field(path)
    }

    /// Cancels every remote check and drops every error.
    pub fn teardown(&mut self) -> Vec<PipelineCommand> {
        self.book.clear_all();
        self.pipeline.clear()
    }

    #[must_use]
    pub fn snapshot(&self) -> ValidationSnapshot {
        ValidationSnapshot::new(self.book.to_errors(), self.pipeline.pending())
    }

    #[must_use]
    pub fn phase(&self, key: &CheckKey) -> CheckPhase {
        self.pipeline.phase(key)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pipeline.has_pending()
    }

    /// Check slot of the async rule of `kind` bound to `field`.
    #[must_use]
    pub fn key_for(&self, field: &FieldPath, kind: &RuleKind) -> Option<CheckKey> {
        self.registry
            .rules_for(field)
            .find(|r| r.is_async() && &r.kind == kind)
            .map(|r| CheckKey::new(r.field.clone(), r.id))
    }
}

fn async_check(rule: &Rule) -> Option<(&Rule, &AsyncRule)> {
    match &rule.check {
        RuleCheck::Async(check) => Some((rule, check)),
        RuleCheck::Sync(_) => None,
    }
}
