//! Field validation engine for formguard.
//!
//! Combines synchronous structural checks, cross-field dependency rules and
//! debounced remote verification into one error model for a nested field
//! tree.
//!
//! # Architecture
//!
//! - **Registry**: rules bound to field paths, with their declared
//!   dependencies. Cycles, self-dependencies and duplicate rule kinds are
//!   rejected when the registry is built.
//! - **Resolver**: for a changed field, the ordered list of rules to run:
//!   the field's own rules, then every rule elsewhere that depends on it.
//! - **Pipeline**: the per-(field, rule) debounce / in-flight state machine
//!   for remote checks, with token-based staleness detection.
//! - **Error book**: per-field error entries, replaced or cleared by the
//!   rule that owns them.
//! - **Validator**: the synchronous core tying the above together. It does
//!   no I/O; it returns pipeline commands for the driver to execute.
//! - **Engine**: the async driver. It owns the field-tree host, runs timers
//!   and remote calls as tasks and processes their results one at a time.
//!
//! ## Event flow
//!
//! 1. The host reports a value change.
//! 2. Sync rules for the field and its dependents run and their errors are
//!    published immediately.
//! 3. Async rules are (re)armed with a kind-specific debounce delay.
//! 4. When a timer fires the remote call is issued under a fresh token.
//! 5. A result is applied only if its token is still current.
//!
//! # Example
//!
//! ```
//! use formguard_engine::{EngineConfig, FieldTree, RuleRegistry, ValidationEngine};
//! use formguard_rules::SyncRule;
//! use formguard_verify::mock::InMemoryVerifier;
//! use std::sync::Arc;
//!
//! let registry = RuleRegistry::builder()
//!     .sync("email", SyncRule::Required)
//!     .sync("email", SyncRule::Email)
//!     .build()
//!     .unwrap();
//! let tree = FieldTree::new().with_field("email", "").unwrap();
//! let mut engine = ValidationEngine::new(
//!     registry,
//!     tree,
//!     Arc::new(InMemoryVerifier::new()),
//!     EngineConfig::default(),
//! );
//!
//! // Invalid from the start, but hidden until the user gets there.
//! let email = "email".parse().unwrap();
//! assert!(!engine.can_submit());
//! assert!(!engine.should_show_error(&email));
//!
//! engine.on_value_changed(&email, "ada@example.org".into()).unwrap();
//! assert!(engine.can_submit());
//! ```

mod aggregate;
mod book;
mod clock;
mod config;
mod engine;
mod error;
mod pipeline;
mod registry;
mod tree;
mod validator;

pub use aggregate::{describe, messages_for, should_show_error};
pub use book::ErrorBook;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{HostEvent, ValidationEngine};
pub use error::{EngineError, EngineResult, RegistryError, RegistryResult};
pub use pipeline::{AsyncPipeline, CheckKey, CheckPhase, PipelineCommand};
pub use registry::{AsyncRule, Rule, RuleCheck, RuleId, RuleRegistry, RuleRegistryBuilder};
pub use tree::{Field, FieldHost, FieldNode, FieldTree, Group};
pub use validator::Validator;
