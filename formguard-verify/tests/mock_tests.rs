use formguard_verify::mock::InMemoryVerifier;
use formguard_verify::{RemoteVerifier, VerifyCall, VerifyError};
use pretty_assertions::assert_eq;
use std::time::Duration;

// ── Canned data ───────────────────────────────────────────────────

#[tokio::test]
async fn taken_usernames_are_case_insensitive() {
    let verifier = InMemoryVerifier::new();
    assert!(!verifier.check_username("admin").await.unwrap().available);
    assert!(!verifier.check_username("John_Doe").await.unwrap().available);
    assert!(verifier.check_username("fresh_name").await.unwrap().available);
}

#[tokio::test]
async fn taken_emails_and_bad_domains() {
    let verifier = InMemoryVerifier::new();
    assert!(!verifier.check_email("JANE@example.com").await.unwrap().available);
    assert!(verifier.check_email("new@example.com").await.unwrap().available);
    assert!(!verifier.check_domain("fake.com").await.unwrap().valid);
    assert!(verifier.check_domain("example.com").await.unwrap().valid);
}

#[tokio::test]
async fn zip_needs_five_characters() {
    let verifier = InMemoryVerifier::new();
    assert!(!verifier.check_zip("123", "US").await.unwrap().valid);
    assert!(verifier.check_zip("12345", "US").await.unwrap().valid);
}

// ── Business rules ────────────────────────────────────────────────

#[tokio::test]
async fn business_rules() {
    let verifier = InMemoryVerifier::new().with_business_rule("evenLength", |v| v.len() % 2 == 0);
    assert!(verifier.check_business_rule("evenLength", "ab").await.unwrap());
    assert!(!verifier.check_business_rule("evenLength", "abc").await.unwrap());
    assert_eq!(
        verifier.check_business_rule("unknown", "x").await,
        Err(VerifyError::Unsupported("unknown".into()))
    );
}

// ── Failures, latency, call log ───────────────────────────────────

#[tokio::test]
async fn failure_injection() {
    let verifier = InMemoryVerifier::new().failing_for("flaky");
    assert!(matches!(
        verifier.check_username("flaky").await,
        Err(VerifyError::Network(_))
    ));
    assert!(verifier.check_username("steady").await.is_ok());

    let down = InMemoryVerifier::new().failing_always();
    assert_eq!(down.check_domain("example.com").await, Err(VerifyError::Unavailable));
}

#[tokio::test(start_paused = true)]
async fn latency_is_simulated() {
    let verifier = InMemoryVerifier::new()
        .with_latency(Duration::from_millis(800))
        .with_latency_for("quick", Duration::from_millis(10));

    let start = tokio::time::Instant::now();
    verifier.check_username("slow").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(800));

    let start = tokio::time::Instant::now();
    verifier.check_username("quick").await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(800));
}

#[tokio::test]
async fn calls_are_logged_in_order() {
    let verifier = InMemoryVerifier::new();
    verifier.check_username("a").await.unwrap();
    verifier.check_zip("12345", "DE").await.unwrap();
    assert_eq!(verifier.call_count(), 2);
    assert_eq!(
        verifier.calls(),
        vec![
            VerifyCall::Username { name: "a".into() },
            VerifyCall::Zip {
                zip: "12345".into(),
                country: "DE".into()
            },
        ]
    );
}

#[tokio::test]
async fn dispatch_maps_answers_to_pass_fail() {
    let verifier = InMemoryVerifier::new();
    let taken = VerifyCall::Username {
        name: "admin".into(),
    };
    assert_eq!(taken.dispatch(&verifier).await, Ok(false));
    let domain = VerifyCall::Domain {
        domain: "example.org".into(),
    };
    assert_eq!(domain.dispatch(&verifier).await, Ok(true));
    assert_eq!(domain.to_string(), "domain(example.org)");
}
