use chrono::NaiveDate;
use formguard_rules::{Predicate, RuleContext, RuleError, SyncRule, ZipTable};
use formguard_types::{ErrorKind, ErrorPayload, FieldPath, FieldValue, RuleKind};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

fn values(pairs: &[(&str, &str)]) -> HashMap<FieldPath, FieldValue> {
    pairs
        .iter()
        .map(|(k, v)| (p(k), FieldValue::text(*v)))
        .collect()
}

fn eval(rule: &SyncRule, own: &str, siblings: &HashMap<FieldPath, FieldValue>) -> Option<ErrorKind> {
    let ctx = RuleContext::new(siblings, today());
    rule.evaluate(&FieldValue::text(own), &ctx).map(|f| f.kind)
}

// ── Construction ──────────────────────────────────────────────────

#[test]
fn invalid_pattern_is_rejected() {
    assert!(matches!(
        SyncRule::pattern("(unclosed"),
        Err(RuleError::InvalidPattern { .. })
    ));
}

#[test]
fn inverted_bounds_are_rejected() {
    assert!(matches!(SyncRule::length(Some(5), Some(2)), Err(RuleError::InvalidBounds { .. })));
    assert!(SyncRule::numeric(Some(10.0), Some(1.0)).is_err());
    assert!(SyncRule::age_range(65, 18).is_err());
}

#[test]
fn file_rule_needs_a_limit() {
    assert!(matches!(SyncRule::file(None, None), Err(RuleError::EmptyFileConstraint)));
    let rule = SyncRule::file(None, Some(&[".PDF"][..])).unwrap();
    match rule {
        SyncRule::FileConstraint {
            allowed_extensions, ..
        } => assert_eq!(allowed_extensions, Some(vec!["pdf".to_string()])),
        other => panic!("unexpected rule {other:?}"),
    }
}

#[test]
fn kinds_and_dependencies() {
    let rule = SyncRule::PasswordMatch {
        password: p("password"),
    };
    assert_eq!(rule.kind(), RuleKind::PasswordMatch);
    assert_eq!(rule.depends_on(), vec![p("password")]);

    let zip = SyncRule::zip_format(p("address.country"));
    assert_eq!(zip.kind(), RuleKind::ZipFormat);
    assert_eq!(zip.depends_on(), vec![p("address.country")]);

    assert!(SyncRule::Required.depends_on().is_empty());
}

// ── Cross-field rules ─────────────────────────────────────────────

#[test]
fn password_match() {
    let rule = SyncRule::PasswordMatch {
        password: p("password"),
    };
    let siblings = values(&[("password", "Secret#123")]);
    assert_eq!(eval(&rule, "Secret#12", &siblings), Some(ErrorKind::PasswordMatch));
    assert_eq!(eval(&rule, "Secret#123", &siblings), None);
}

#[test]
fn password_match_treats_missing_and_empty_alike() {
    let rule = SyncRule::PasswordMatch {
        password: p("password"),
    };
    assert_eq!(eval(&rule, "", &HashMap::new()), None);
}

#[test]
fn date_order_reads_start_sibling() {
    let rule = SyncRule::DateOrder { start: p("startDate") };
    let siblings = values(&[("startDate", "2024-03-10")]);
    assert_eq!(eval(&rule, "2024-03-01", &siblings), Some(ErrorKind::DateRange));
    assert_eq!(eval(&rule, "2024-03-15", &siblings), None);
}

#[test]
fn zip_format_uses_country_sibling() {
    let rule = SyncRule::zip_format(p("country"));
    let us = values(&[("country", "US")]);
    let ctx = RuleContext::new(&us, today());
    let failure = rule.evaluate(&FieldValue::text("123"), &ctx).unwrap();
    assert_eq!(failure.kind, ErrorKind::ZipCode);
    assert_eq!(
        failure.payload,
        ErrorPayload::Country {
            country: "US".into()
        }
    );

    assert_eq!(eval(&rule, "12345-6789", &us), None);
}

#[test]
fn zip_format_is_noop_for_unknown_country() {
    let rule = SyncRule::zip_format(p("country"));
    assert_eq!(eval(&rule, "123", &values(&[("country", "BR")])), None);
    assert_eq!(eval(&rule, "123", &values(&[("country", "")])), None);
}

#[test]
fn conditional_required_follows_predicate() {
    let rule = SyncRule::conditional_required(
        Predicate::field_equals(p("address.type"), "other"),
        vec![p("address.type")],
    );
    assert_eq!(rule.depends_on(), vec![p("address.type")]);

    let other = values(&[("address.type", "other")]);
    assert_eq!(eval(&rule, "   ", &other), Some(ErrorKind::Required));
    assert_eq!(eval(&rule, "Garage", &other), None);
    assert_eq!(eval(&rule, "", &values(&[("address.type", "home")])), None);
}

#[test]
fn conditional_required_reevaluates_external_state() {
    let flag = Arc::new(AtomicBool::new(false));
    let captured = flag.clone();
    let rule = SyncRule::conditional_required(
        Predicate::new(move |_| captured.load(Ordering::SeqCst)),
        Vec::new(),
    );
    let none = HashMap::new();
    assert_eq!(eval(&rule, "", &none), None);
    flag.store(true, Ordering::SeqCst);
    assert_eq!(eval(&rule, "", &none), Some(ErrorKind::Required));
}

// ── Self-contained rules ──────────────────────────────────────────

#[test]
fn password_strength_rule() {
    let rule = SyncRule::PasswordStrength { min_score: 4 };
    let none = HashMap::new();
    let ctx = RuleContext::new(&none, today());
    let failure = rule.evaluate(&FieldValue::text("abcdefgh"), &ctx).unwrap();
    match failure.payload {
        ErrorPayload::Strength {
            score,
            min_score,
            feedback,
        } => {
            assert_eq!(score, 2);
            assert_eq!(min_score, 4);
            assert_eq!(feedback.len(), 3);
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert!(rule.evaluate(&FieldValue::text("Abcdefg1!"), &ctx).is_none());
    assert!(rule.evaluate(&FieldValue::Empty, &ctx).is_none());
}

#[test]
fn age_range_uses_context_date() {
    let rule = SyncRule::age_range(18, 65).unwrap();
    assert_eq!(eval(&rule, "2010-01-01", &HashMap::new()), Some(ErrorKind::AgeRange));
    assert_eq!(eval(&rule, "1990-01-01", &HashMap::new()), None);
}

#[test]
fn pattern_rule_is_anchored() {
    let rule = SyncRule::pattern("[a-z0-9_]+").unwrap();
    assert_eq!(eval(&rule, "john_doe", &HashMap::new()), None);
    assert_eq!(eval(&rule, "john doe", &HashMap::new()), Some(ErrorKind::Pattern));
}

// ── Zip table ─────────────────────────────────────────────────────

#[test]
fn builtin_zip_table() {
    let table = ZipTable::builtin();
    assert_eq!(table.countries(), vec!["AU", "CA", "DE", "FR", "JP", "UK", "US"]);
    assert_eq!(table.matches("CA", "K1A 0B1"), Some(true));
    assert_eq!(table.matches("UK", "SW1A 1AA"), Some(true));
    assert_eq!(table.matches("JP", "1000001"), Some(false));
    assert_eq!(table.matches("BR", "01001-000"), None);
}

#[test]
fn custom_zip_table() {
    let table = ZipTable::empty().with("BR", r"\d{5}-\d{3}").unwrap();
    assert!(table.knows("BR"));
    assert_eq!(table.matches("BR", "01001-000"), Some(true));
    assert!(ZipTable::empty().with("XX", "(").is_err());
}
