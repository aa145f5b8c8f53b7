//! The async driver.
//!
//! Owns the field-tree host and the [`Validator`]. Debounce timers and
//! remote calls run as tokio tasks that report back over one mpsc channel;
//! the engine processes those reports and host events strictly one at a
//! time, so rule evaluation never overlaps. Superseded tasks are aborted,
//! and anything they managed to send first is dropped by the token check.

use formguard_rules::ValueSource;
use formguard_types::{CheckToken, FieldPath, FieldValue, ValidationSnapshot};
use formguard_verify::{RemoteVerifier, VerifyError, VerifyResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::aggregate;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::pipeline::{CheckKey, PipelineCommand};
use crate::registry::RuleRegistry;
use crate::tree::FieldHost;
use crate::validator::Validator;

/// Events a host may push into [`ValidationEngine::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    ValueChanged { path: FieldPath, value: FieldValue },
    Dirty { path: FieldPath },
    Touched { path: FieldPath },
    ForceTouchAll,
    ValidateAll,
}

/// Reports from timer and remote-call tasks.
#[derive(Debug)]
enum TaskEvent {
    TimerFired {
        key: CheckKey,
        token: CheckToken,
    },
    Resolved {
        key: CheckKey,
        token: CheckToken,
        outcome: VerifyResult<bool>,
    },
}

/// Running timer / call tasks, one per check slot. Aborts them all on drop.
#[derive(Default)]
struct Tasks(HashMap<CheckKey, JoinHandle<()>>);

impl Tasks {
    fn replace(&mut self, key: CheckKey, handle: JoinHandle<()>) {
        if let Some(old) = self.0.insert(key, handle) {
            old.abort();
        }
    }

    fn abort(&mut self, key: &CheckKey) {
        if let Some(handle) = self.0.remove(key) {
            handle.abort();
        }
    }

    fn forget(&mut self, key: &CheckKey) {
        self.0.remove(key);
    }

    fn abort_all(&mut self) {
        for (_, handle) in self.0.drain() {
            handle.abort();
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl Drop for Tasks {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Validation for one field tree.
///
/// Remote checks are spawned onto the current tokio runtime, so any call
/// that may schedule one must run inside it.
pub struct ValidationEngine<H: FieldHost> {
    validator: Validator,
    host: H,
    verifier: Arc<dyn RemoteVerifier>,
    check_timeout: Option<Duration>,
    events_tx: mpsc::Sender<TaskEvent>,
    events_rx: mpsc::Receiver<TaskEvent>,
    tasks: Tasks,
    snapshot: Arc<ValidationSnapshot>,
    snapshot_tx: watch::Sender<Arc<ValidationSnapshot>>,
}

impl<H: FieldHost> ValidationEngine<H> {
    /// Creates an engine measuring dates against the system clock.
    pub fn new(
        registry: RuleRegistry,
        host: H,
        verifier: Arc<dyn RemoteVerifier>,
        config: EngineConfig,
    ) -> Self {
        Self::with_clock(registry, host, verifier, config, Arc::new(SystemClock))
    }

    /// Creates an engine and runs every sync rule against the host's
    /// initial values. Remote checks start on the first change.
    pub fn with_clock(
        registry: RuleRegistry,
        host: H,
        verifier: Arc<dyn RemoteVerifier>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let check_timeout = config.check_timeout();
        let mut validator = Validator::new(registry, config, clock);
        validator.revalidate(&host);
        let snapshot = Arc::new(validator.snapshot());
        let (snapshot_tx, _) = watch::channel(Arc::clone(&snapshot));

        let mut engine = Self {
            validator,
            host,
            verifier,
            check_timeout,
            events_tx,
            events_rx,
            tasks: Tasks::default(),
            snapshot,
            snapshot_tx,
        };
        engine.host.apply_snapshot(&engine.snapshot);
        engine
    }

    // ── Host events ───────────────────────────────────────────────────

    /// The host stored a new value at `path`. Sync errors are published
    /// before this returns; remote checks are debounced.
    pub fn on_value_changed(&mut self, path: &FieldPath, value: FieldValue) -> EngineResult<()> {
        if !self.host.set_value(path, value) {
            return Err(EngineError::UnknownField(path.clone()));
        }
        let commands = self.validator.value_changed(&self.host, path);
        self.publish();
        self.execute(commands);
        Ok(())
    }

    pub fn on_dirty(&mut self, path: &FieldPath) -> EngineResult<()> {
        if self.host.mark_dirty(path) {
            Ok(())
        } else {
            Err(EngineError::UnknownField(path.clone()))
        }
    }

    pub fn on_touched(&mut self, path: &FieldPath) -> EngineResult<()> {
        if self.host.mark_touched(path) {
            Ok(())
        } else {
            Err(EngineError::UnknownField(path.clone()))
        }
    }

    /// Marks every field touched so all invalid fields show their errors.
    pub fn force_touch_all(&mut self) {
        self.host.mark_all_touched();
    }

    /// Re-runs every rule and restarts every remote check.
    pub fn validate_all(&mut self) {
        let commands = self.validator.validate_all(&self.host);
        self.publish();
        self.execute(commands);
    }

    /// Re-runs every sync rule. Remote checks are left as they are.
    pub fn revalidate(&mut self) {
        self.validator.revalidate(&self.host);
        self.publish();
    }

    /// The host dropped `path` (and anything beneath it) from the tree.
    pub fn on_field_removed(&mut self, path: &FieldPath) {
        let commands = self.validator.field_removed(path);
        self.publish();
        self.execute(commands);
    }

    pub fn handle(&mut self, event: HostEvent) -> EngineResult<()> {
        match event {
            HostEvent::ValueChanged { path, value } => self.on_value_changed(&path, value),
            HostEvent::Dirty { path } => self.on_dirty(&path),
            HostEvent::Touched { path } => self.on_touched(&path),
            HostEvent::ForceTouchAll => {
                self.force_touch_all();
                Ok(())
            }
            HostEvent::ValidateAll => {
                self.validate_all();
                Ok(())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────

    #[must_use]
    pub fn current_snapshot(&self) -> Arc<ValidationSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// A receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ValidationSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    #[must_use]
    pub fn should_show_error(&self, path: &FieldPath) -> bool {
        aggregate::should_show_error(&self.snapshot, &self.host, path)
    }

    #[must_use]
    pub fn messages(&self, path: &FieldPath) -> Vec<String> {
        aggregate::messages_for(&self.snapshot, path)
    }

    /// No errors and nothing outstanding.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.snapshot.is_valid()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.validator.has_pending()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Value at `path` as the host currently holds it.
    pub fn value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.host.value(path)
    }

    /// Cancels all outstanding checks and hands the host back.
    pub fn into_host(mut self) -> H {
        self.validator.teardown();
        self.tasks.abort_all();
        self.host
    }

    // ── Driving ───────────────────────────────────────────────────────

    /// Waits for and processes the next timer or call report. Returns
    /// `false` without waiting when nothing is outstanding.
    pub async fn step(&mut self) -> EngineResult<bool> {
        if !self.validator.has_pending() {
            return Ok(false);
        }
        let event = self
            .events_rx
            .recv()
            .await
            .ok_or(EngineError::ChannelClosed)?;
        self.on_task_event(event);
        Ok(true)
    }

    /// Processes reports until no check is outstanding.
    pub async fn settle(&mut self) -> EngineResult<()> {
        while self.step().await? {}
        Ok(())
    }

    /// Serves host events until `host_events` closes, then cancels what is
    /// still running and returns the host. A host event naming an unknown
    /// field is logged and skipped.
    pub async fn run(mut self, mut host_events: mpsc::Receiver<HostEvent>) -> H {
        loop {
            tokio::select! {
                event = host_events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = self.handle(event) {
                            warn!("host event rejected: {e}");
                        }
                    }
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.on_task_event(event),
            }
        }
        debug!("host channel closed, cancelling {} tasks", self.tasks.len());
        self.into_host()
    }

    fn on_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::TimerFired { key, token } => {
                if let Some(command) = self.validator.timer_fired(&key, token) {
                    self.execute(vec![command]);
                }
            }
            TaskEvent::Resolved {
                key,
                token,
                outcome,
            } => {
                if self.validator.check_resolved(&key, token, outcome) {
                    self.tasks.forget(&key);
                    self.publish();
                }
            }
        }
    }

    fn publish(&mut self) {
        let next = self.validator.snapshot();
        if next == *self.snapshot {
            return;
        }
        self.snapshot = Arc::new(next);
        self.host.apply_snapshot(&self.snapshot);
        self.snapshot_tx.send_replace(Arc::clone(&self.snapshot));
    }

    fn execute(&mut self, commands: Vec<PipelineCommand>) {
        for command in commands {
            match command {
                PipelineCommand::Arm { key, token, delay } => {
                    let tx = self.events_tx.clone();
                    let report = key.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(TaskEvent::TimerFired { key: report, token }).await;
                    });
                    self.tasks.replace(key, handle);
                }
                PipelineCommand::Issue { key, token, call } => {
                    let tx = self.events_tx.clone();
                    let verifier = Arc::clone(&self.verifier);
                    let timeout = self.check_timeout;
                    let report = key.clone();
                    let handle = tokio::spawn(async move {
                        let outcome = match timeout {
                            Some(limit) => {
                                tokio::time::timeout(limit, call.dispatch(verifier.as_ref()))
                                    .await
                                    .unwrap_or(Err(VerifyError::Timeout))
                            }
                            None => call.dispatch(verifier.as_ref()).await,
                        };
                        let _ = tx
                            .send(TaskEvent::Resolved {
                                key: report,
                                token,
                                outcome,
                            })
                            .await;
                    });
                    self.tasks.replace(key, handle);
                }
                PipelineCommand::Cancel { key } => self.tasks.abort(&key),
            }
        }
    }
}
