use formguard_engine::{FieldHost, FieldNode, FieldTree};
use formguard_rules::ValueSource;
use formguard_types::{ErrorEntry, ErrorKind, ErrorPayload, FieldPath, FieldValue, RuleKind, ValidationSnapshot};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn registration() -> FieldTree {
    FieldTree::from_json(&json!({
        "username": "ada",
        "age": 36,
        "agreeToTerms": false,
        "nickname": null,
        "address": {
            "city": "London",
            "zipCode": "SW1A 1AA"
        },
        "addresses": [
            { "city": "Paris" },
            { "city": "Berlin" }
        ]
    }))
    .unwrap()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn json_scalars_become_fields() {
    let tree = registration();
    assert_eq!(tree.value(&p("username")), Some(&FieldValue::text("ada")));
    assert_eq!(tree.value(&p("age")), Some(&FieldValue::Number(36.0)));
    assert_eq!(tree.value(&p("agreeToTerms")), Some(&FieldValue::Bool(false)));
    assert_eq!(tree.value(&p("nickname")), Some(&FieldValue::Empty));
}

#[test]
fn arrays_use_numeric_segments() {
    let tree = registration();
    assert_eq!(tree.value(&p("addresses.1.city")), Some(&FieldValue::text("Berlin")));
    assert!(matches!(tree.get(&p("addresses.0")), Some(FieldNode::Group(_))));
    assert!(tree.value(&p("addresses.2.city")).is_none());
}

#[test]
fn groups_are_not_values() {
    let tree = registration();
    assert!(tree.value(&p("address")).is_none());
    assert!(tree.field(&p("address")).is_none());
    assert!(tree.value(&p("username.first")).is_none());
}

#[test]
fn field_paths_are_depth_first_in_document_order() {
    let tree = FieldTree::new()
        .with_field("b", "")
        .unwrap()
        .with_field("a.y", "")
        .unwrap()
        .with_field("a.x", "")
        .unwrap()
        .with_field("c", "")
        .unwrap();
    let paths: Vec<String> = tree.field_paths().iter().map(ToString::to_string).collect();
    assert_eq!(paths, vec!["b", "a.y", "a.x", "c"]);
}

#[test]
fn insert_rejects_shape_conflicts() {
    let tree = FieldTree::new().with_field("address.city", "").unwrap();
    assert!(tree.clone().with_field("address", "x").is_err());
    assert!(tree.clone().with_field("address.city.name", "x").is_err());
    assert!(tree.with_field("address..city", "x").is_err());
}

#[test]
fn empty_or_dotted_keys_are_rejected() {
    assert!(FieldTree::from_json(&json!({ "": 1 })).is_err());
    assert!(FieldTree::from_json(&json!({ "a.b": 1 })).is_err());
}

#[test]
fn scalar_document_gives_an_empty_tree() {
    let tree = FieldTree::from_json(&json!("just text")).unwrap();
    assert!(tree.field_paths().is_empty());
}

#[test]
fn remove_drops_a_subtree() {
    let mut tree = registration();
    assert!(matches!(tree.remove(&p("addresses.0")), Some(FieldNode::Group(_))));
    assert!(tree.value(&p("addresses.0.city")).is_none());
    assert!(tree.value(&p("addresses.1.city")).is_some());
    assert!(tree.remove(&p("missing")).is_none());
}

// ── Host contract ────────────────────────────────────────────────

#[test]
fn set_value_only_targets_fields() {
    let mut tree = registration();
    assert!(tree.set_value(&p("address.city"), "Leeds".into()));
    assert_eq!(tree.value(&p("address.city")), Some(&FieldValue::text("Leeds")));
    assert!(!tree.set_value(&p("address"), "x".into()));
    assert!(!tree.set_value(&p("country"), "x".into()));
}

#[test]
fn dirty_and_touched_flags() {
    let mut tree = registration();
    assert!(!tree.is_dirty(&p("username")));
    assert!(tree.mark_dirty(&p("username")));
    assert!(tree.is_dirty(&p("username")));
    assert!(!tree.is_touched(&p("username")));

    assert!(tree.mark_touched(&p("address")));
    assert!(tree.is_touched(&p("address")));
    assert!(!tree.is_touched(&p("address.city")));

    assert!(!tree.mark_dirty(&p("address")));
    assert!(!tree.mark_touched(&p("nowhere")));
}

#[test]
fn mark_all_touched_reaches_every_level() {
    let mut tree = registration();
    tree.mark_all_touched();
    for path in tree.field_paths() {
        assert!(tree.is_touched(&path), "{path} not touched");
    }
    assert!(tree.is_touched(&p("addresses")));
    assert!(tree.is_touched(&p("addresses.1")));
    assert!(!tree.is_dirty(&p("username")));
}

#[test]
fn apply_snapshot_replaces_per_field_state() {
    let mut tree = registration();
    let entry = ErrorEntry::new(
        p("address.zipCode"),
        ErrorKind::ZipCode,
        ErrorPayload::Country {
            country: "US".into(),
        },
        RuleKind::ZipFormat,
        3,
    );
    let snapshot = ValidationSnapshot::new(
        BTreeMap::from([(p("address.zipCode"), vec![entry.clone()])]),
        BTreeMap::from([(p("username"), BTreeSet::from([RuleKind::UsernameAvailable]))]),
    );
    tree.apply_snapshot(&snapshot);
    assert_eq!(tree.field(&p("address.zipCode")).unwrap().errors, vec![entry]);
    assert!(tree.field(&p("username")).unwrap().pending);
    assert_eq!(tree.errors().len(), 1);

    tree.apply_snapshot(&ValidationSnapshot::default());
    assert!(tree.errors().is_empty());
    assert!(!tree.field(&p("username")).unwrap().pending);
}
