use chrono::NaiveDate;
use formguard_engine::{
    AsyncRule, EngineConfig, EngineError, FieldHost, FieldTree, FixedClock, HostEvent,
    RuleRegistry, ValidationEngine,
};
use formguard_rules::{SyncRule, ValueSource};
use formguard_types::{ErrorKind, FieldPath, FieldValue};
use formguard_verify::VerifyCall;
use formguard_verify::mock::InMemoryVerifier;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn registry() -> RuleRegistry {
    RuleRegistry::builder()
        .sync("username", SyncRule::Required)
        .sync("username", SyncRule::length(Some(3), Some(20)).unwrap())
        .remote("username", AsyncRule::UsernameAvailable)
        .sync("email", SyncRule::Required)
        .sync("email", SyncRule::Email)
        .remote("email", AsyncRule::EmailAvailable)
        .remote("email", AsyncRule::EmailDomain)
        .sync("address.zipCode", SyncRule::zip_format(p("address.country")))
        .remote("address.zipCode", AsyncRule::ZipCode { country: p("address.country") })
        .build()
        .unwrap()
}

fn tree() -> FieldTree {
    FieldTree::new()
        .with_field("username", "")
        .unwrap()
        .with_field("email", "")
        .unwrap()
        .with_field("address.country", "")
        .unwrap()
        .with_field("address.zipCode", "")
        .unwrap()
}

fn engine_with(verifier: Arc<InMemoryVerifier>, config: EngineConfig) -> ValidationEngine<FieldTree> {
    ValidationEngine::with_clock(
        registry(),
        tree(),
        verifier,
        config,
        Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap())),
    )
}

fn engine(verifier: Arc<InMemoryVerifier>) -> ValidationEngine<FieldTree> {
    engine_with(verifier, EngineConfig::default())
}

fn set(engine: &mut ValidationEngine<FieldTree>, path: &str, value: &str) {
    engine.on_value_changed(&p(path), FieldValue::text(value)).unwrap();
}

// ── Construction ─────────────────────────────────────────────────

#[tokio::test]
async fn initial_values_are_validated_but_hidden() {
    let engine = engine(Arc::new(InMemoryVerifier::new()));
    let snapshot = engine.current_snapshot();
    assert!(snapshot.has_error(&p("username"), &ErrorKind::Required));
    assert!(snapshot.has_error(&p("email"), &ErrorKind::Required));
    assert!(!engine.has_pending());
    assert!(!engine.should_show_error(&p("username")));
    assert!(!engine.can_submit());
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let mut engine = engine(Arc::new(InMemoryVerifier::new()));
    let err = engine
        .on_value_changed(&p("nickname"), "x".into())
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownField(ref path) if path == &p("nickname")));
    assert!(engine.on_dirty(&p("nickname")).is_err());
    assert!(engine.on_touched(&p("address")).is_ok());
}

// ── Sync before async ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn sync_errors_are_visible_before_remote_checks_resolve() {
    let verifier = Arc::new(InMemoryVerifier::new());
    let mut engine = engine(Arc::clone(&verifier));
    set(&mut engine, "username", "ad");

    let snapshot = engine.current_snapshot();
    assert!(snapshot.has_error(&p("username"), &ErrorKind::MinLength));
    assert!(snapshot.is_pending(&p("username")));
    assert_eq!(verifier.call_count(), 0);

    engine.settle().await.unwrap();
    assert_eq!(verifier.call_count(), 1);
    assert!(!engine.current_snapshot().is_pending(&p("username")));
}

#[tokio::test(start_paused = true)]
async fn host_sees_applied_snapshot() {
    let mut engine = engine(Arc::new(InMemoryVerifier::new()));
    set(&mut engine, "username", "admin");
    engine.settle().await.unwrap();

    let field = engine.host().field(&p("username")).unwrap();
    assert_eq!(field.errors.len(), 1);
    assert_eq!(field.errors[0].kind, ErrorKind::UsernameTaken);
    assert!(!field.pending);
}

// ── Scenarios ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn admin_is_taken_and_clearing_cancels() {
    let verifier = Arc::new(InMemoryVerifier::new().with_latency(Duration::from_secs(2)));
    let mut engine = engine(Arc::clone(&verifier));

    set(&mut engine, "username", "admin");
    engine.settle().await.unwrap();
    assert!(
        engine
            .current_snapshot()
            .has_error(&p("username"), &ErrorKind::UsernameTaken)
    );
    assert_eq!(engine.messages(&p("username")), vec!["Username is already taken"]);

    set(&mut engine, "username", "admin");
    assert!(engine.step().await.unwrap());
    tokio::task::yield_now().await;
    assert_eq!(verifier.call_count(), 2);
    assert!(engine.has_pending());

    set(&mut engine, "username", "");
    assert!(!engine.has_pending());
    let snapshot = engine.current_snapshot();
    assert!(!snapshot.has_error(&p("username"), &ErrorKind::UsernameTaken));
    assert!(snapshot.has_error(&p("username"), &ErrorKind::Required));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!engine.step().await.unwrap());
    assert!(
        !engine
            .current_snapshot()
            .has_error(&p("username"), &ErrorKind::UsernameTaken)
    );
}

#[tokio::test(start_paused = true)]
async fn zip_follows_country_changes() {
    let verifier = Arc::new(InMemoryVerifier::new());
    let mut engine = engine(Arc::clone(&verifier));

    set(&mut engine, "address.country", "US");
    set(&mut engine, "address.zipCode", "123");
    let snapshot = engine.current_snapshot();
    assert!(snapshot.has_error(&p("address.zipCode"), &ErrorKind::ZipCode));
    engine.settle().await.unwrap();
    assert!(
        engine
            .current_snapshot()
            .has_error(&p("address.zipCode"), &ErrorKind::InvalidZipCode)
    );

    set(&mut engine, "address.country", "BR");
    assert!(!engine.current_snapshot().has_error(&p("address.zipCode"), &ErrorKind::ZipCode));
    engine.settle().await.unwrap();

    assert_eq!(
        verifier.calls(),
        vec![
            VerifyCall::Zip {
                zip: "123".into(),
                country: "US".into()
            },
            VerifyCall::Zip {
                zip: "123".into(),
                country: "BR".into()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_domain_is_reported_with_its_name() {
    let mut engine = engine(Arc::new(InMemoryVerifier::new()));
    set(&mut engine, "email", "someone@fake.com");
    engine.settle().await.unwrap();
    assert_eq!(
        engine.messages(&p("email")),
        vec!["Email domain fake.com does not accept mail"]
    );
}

// ── Debounce & staleness ─────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn rapid_changes_collapse_into_one_call() {
    let verifier = Arc::new(InMemoryVerifier::new());
    let mut engine = engine(Arc::clone(&verifier));

    for partial in ["a", "ad", "ada", "ada_", "ada_l"] {
        set(&mut engine, "username", partial);
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    engine.settle().await.unwrap();

    assert_eq!(
        verifier.calls(),
        vec![VerifyCall::Username {
            name: "ada_l".into()
        }]
    );
    assert!(engine.current_snapshot().errors_for(&p("username")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn changes_outside_the_window_each_get_a_call() {
    let verifier = Arc::new(InMemoryVerifier::new());
    let mut engine = engine(Arc::clone(&verifier));

    set(&mut engine, "username", "ada");
    engine.settle().await.unwrap();
    set(&mut engine, "username", "grace");
    engine.settle().await.unwrap();
    assert_eq!(verifier.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_stale_answer_never_overwrites_a_newer_one() {
    let verifier = Arc::new(
        InMemoryVerifier::new().with_latency_for("admin", Duration::from_secs(3)),
    );
    let mut engine = engine(Arc::clone(&verifier));

    set(&mut engine, "username", "admin");
    assert!(engine.step().await.unwrap());
    tokio::task::yield_now().await;
    assert_eq!(verifier.call_count(), 1);

    set(&mut engine, "username", "ada_l");
    engine.settle().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!engine.step().await.unwrap());

    assert!(engine.current_snapshot().errors_for(&p("username")).is_empty());
}

// ── Failure policy ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn verifier_outage_is_inconclusive() {
    let mut engine = engine(Arc::new(InMemoryVerifier::new().failing_always()));
    set(&mut engine, "username", "admin");
    engine.settle().await.unwrap();
    let snapshot = engine.current_snapshot();
    assert!(snapshot.errors_for(&p("username")).is_empty());
    assert!(!snapshot.is_pending(&p("username")));
}

#[tokio::test(start_paused = true)]
async fn timeout_is_inconclusive() {
    let verifier = Arc::new(InMemoryVerifier::new().with_latency(Duration::from_secs(30)));
    let config = EngineConfig {
        check_timeout_ms: Some(1_000),
        ..EngineConfig::default()
    };
    let mut engine = engine_with(verifier, config);
    set(&mut engine, "username", "admin");
    engine.settle().await.unwrap();
    assert!(engine.current_snapshot().errors_for(&p("username")).is_empty());
    assert!(!engine.has_pending());
}

#[tokio::test(start_paused = true)]
async fn without_timeout_a_slow_check_stays_pending() {
    let verifier = Arc::new(InMemoryVerifier::new().with_latency(Duration::from_secs(30)));
    let mut engine = engine(verifier);
    set(&mut engine, "username", "admin");
    assert!(engine.step().await.unwrap());
    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(engine.current_snapshot().is_pending(&p("username")));
    assert!(!engine.can_submit());
}

// ── Display gating ───────────────────────────────────────────────

#[tokio::test]
async fn errors_show_after_interaction_or_forced_touch() {
    let mut engine = engine(Arc::new(InMemoryVerifier::new()));
    assert!(!engine.should_show_error(&p("email")));

    engine.on_dirty(&p("email")).unwrap();
    assert!(engine.should_show_error(&p("email")));
    assert!(!engine.should_show_error(&p("username")));

    engine.force_touch_all();
    assert!(engine.should_show_error(&p("username")));
    assert!(engine.host().is_touched(&p("address")));
    assert!(!engine.should_show_error(&p("address.country")));
}

// ── Event loop ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn run_serves_host_events_and_returns_the_host() {
    let engine = engine(Arc::new(InMemoryVerifier::new()));
    let mut snapshots = engine.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(engine.run(rx));

    tx.send(HostEvent::ValueChanged {
        path: p("username"),
        value: "john_doe".into(),
    })
    .await
    .unwrap();
    tx.send(HostEvent::Touched { path: p("username") }).await.unwrap();

    snapshots
        .wait_for(|s| s.has_error(&p("username"), &ErrorKind::UsernameTaken))
        .await
        .unwrap();

    tx.send(HostEvent::ForceTouchAll).await.unwrap();
    drop(tx);
    let host = task.await.unwrap();

    assert!(host.is_touched(&p("email")));
    let username = host.field(&p("username")).unwrap();
    assert_eq!(username.value, FieldValue::text("john_doe"));
    assert_eq!(username.errors[0].kind, ErrorKind::UsernameTaken);
}

#[tokio::test(start_paused = true)]
async fn into_host_cancels_outstanding_checks() {
    let verifier = Arc::new(InMemoryVerifier::new());
    let mut engine = engine(Arc::clone(&verifier));
    set(&mut engine, "username", "admin");
    let host = engine.into_host();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(verifier.call_count(), 0);
    assert_eq!(host.value(&p("username")), Some(&FieldValue::text("admin")));
}
