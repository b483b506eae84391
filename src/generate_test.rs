// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for range record generation

use super::generate::*;
use crate::facts::RecordTemplate;
use crate::types::CompileError;
use crate::zones::{Policy, Zone, ZoneKind, ZoneStore};
use serde_json::json;
use std::collections::BTreeMap;

type Directives = BTreeMap<String, BTreeMap<String, BTreeMap<String, RecordTemplate>>>;

fn directives(value: serde_json::Value) -> Directives {
    serde_json::from_value(value).unwrap()
}

fn example_store() -> ZoneStore {
    let mut store = ZoneStore::new();
    store.insert("example.com", Zone::new(ZoneKind::Native));
    store
}

fn values(store: &ZoneStore, name: &str, rtype: &str) -> Vec<String> {
    store
        .get("example.com")
        .and_then(|zone| zone.records.get(name))
        .and_then(|types| types.get(rtype))
        .map(|values| values.iter().map(|rdata| rdata.content.clone()).collect())
        .unwrap_or_default()
}

// ========== Range Parser ==========

#[test]
fn test_parse_range() {
    assert_eq!(
        parse_range("1-3").unwrap(),
        GenerateRange { start: 1, end: 3, step: 1 }
    );
    assert_eq!(
        parse_range(" 10 - 20 / 5 ").unwrap(),
        GenerateRange { start: 10, end: 20, step: 5 }
    );
    assert_eq!(parse_range("4-4").unwrap().values().collect::<Vec<_>>(), vec![4]);
}

#[test]
fn test_parse_range_step_values() {
    let range = parse_range("0-10/4").unwrap();
    assert_eq!(range.values().collect::<Vec<_>>(), vec![0, 4, 8]);
}

#[test]
fn test_parse_range_errors() {
    for input in ["", "1", "a-3", "1-3x", "3-1", "1-3/0", "-1-3"] {
        assert!(
            matches!(parse_range(input), Err(CompileError::Config(_))),
            "{:?} should be rejected",
            input
        );
    }
}

#[test]
fn test_parse_range_rejects_oversized_ranges() {
    assert!(matches!(
        parse_range("0-99999999999"),
        Err(CompileError::Config(_))
    ));

    let widest = format!("1-{}", MAX_GENERATE_COUNT);
    assert_eq!(parse_range(&widest).unwrap().count(), MAX_GENERATE_COUNT);

    let stepped = format!("0-{}/2", MAX_GENERATE_COUNT * 2);
    assert!(parse_range(&stepped).is_err());
}

// ========== Names ==========

#[test]
fn test_generated_name() {
    assert_eq!(generated_name("$.example.com", "example.com", 7), "7.example.com");
    assert_eq!(generated_name("host-$", "example.com", 7), "host-7.example.com");
    assert_eq!(generated_name("dhcp-$.example.com.", "example.com", 2), "dhcp-2.example.com");
    // not on a label boundary, so placed under the zone
    assert_eq!(generated_name("$example.com", "example.com", 1), "1example.com.example.com");
}

// ========== Expansion ==========

#[test]
fn test_expand_generate() {
    let mut store = example_store();
    let generate = directives(json!({
        "example.com": {
            "1-3": {"$.example.com": [{"A": [{"c": "10.0.0.$"}]}]}
        }
    }));

    expand_generate(&generate, &mut store).unwrap();

    assert_eq!(values(&store, "1.example.com", "A"), vec!["10.0.0.1"]);
    assert_eq!(values(&store, "2.example.com", "A"), vec!["10.0.0.2"]);
    assert_eq!(values(&store, "3.example.com", "A"), vec!["10.0.0.3"]);
    assert_eq!(store.get("example.com").unwrap().records.len(), 3);
}

#[test]
fn test_expand_generate_replaces_existing_name() {
    let mut store = example_store();
    store.add_record("1.example.com", "A", "192.0.2.1", Policy::AppendIfAbsent);
    store.add_record("1.example.com", "TXT", "\"old\"", Policy::AppendIfAbsent);
    let generate = directives(json!({
        "example.com": {
            "1-1": {"$": {"A": [{"c": "10.0.0.$"}], "TXT": [{"c": "\"host $\"", "disabled": false}]}}
        }
    }));

    expand_generate(&generate, &mut store).unwrap();

    assert_eq!(values(&store, "1.example.com", "A"), vec!["10.0.0.1"]);
    assert_eq!(values(&store, "1.example.com", "TXT"), vec!["\"host 1\""]);
    let txt = &store.get("example.com").unwrap().records["1.example.com"]["TXT"][0];
    assert_eq!(txt.extra.get("disabled"), Some(&json!(false)));
}

#[test]
fn test_expand_generate_unknown_zone_is_skipped() {
    let mut store = example_store();
    let generate = directives(json!({
        "example.org": {"1-2": {"$": {"A": [{"c": "10.0.0.$"}]}}}
    }));

    expand_generate(&generate, &mut store).unwrap();

    assert!(store.get("example.com").unwrap().records.is_empty());
    assert!(!store.contains("example.org"));
}

#[test]
fn test_expand_generate_bad_range() {
    let mut store = example_store();
    let generate = directives(json!({
        "example.com": {"5-1": {"$": {"A": [{"c": "10.0.0.$"}]}}}
    }));

    assert!(matches!(
        expand_generate(&generate, &mut store),
        Err(CompileError::Config(_))
    ));
}
