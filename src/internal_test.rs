// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for internal-naming records

use super::internal::*;
use crate::facts::{InternalRecordsDirective, Inventory};
use crate::sshfp::{FingerprintSource, Sshfp};
use crate::types::CompileResult;
use crate::zones::{Policy, Zone, ZoneKind, ZoneStore};
use serde_json::json;
use std::collections::HashMap;

/// In-memory fingerprint source keyed by host id
#[derive(Default)]
struct StaticFingerprints(HashMap<String, Vec<Sshfp>>);

impl StaticFingerprints {
    fn with(mut self, host: &str, entries: &[(u8, u8, &str)]) -> Self {
        self.0.insert(
            host.to_string(),
            entries
                .iter()
                .map(|(algorithm, fp_type, fingerprint)| Sshfp {
                    algorithm: *algorithm,
                    fp_type: *fp_type,
                    fingerprint: fingerprint.to_string(),
                })
                .collect(),
        );
        self
    }
}

impl FingerprintSource for StaticFingerprints {
    fn fingerprints(&self, host: &str) -> CompileResult<Vec<Sshfp>> {
        Ok(self.0.get(host).cloned().unwrap_or_default())
    }
}

fn directive(generate_sshfp: bool) -> InternalRecordsDirective {
    InternalRecordsDirective {
        subdomain: "int".to_string(),
        zone: "example.com".to_string(),
        generate_sshfp,
        sshfp_algorithms: None,
        sshfp_fp_types: None,
    }
}

fn inventory() -> Inventory {
    Inventory::from_value(json!({
        "web1": {"ansible_host": "10.0.0.10"},
        "db1": {"ansible_host": "10.0.0.11", "inventory_hostname": "database1"},
        "lab1": {"ansible_host": "10.0.0.12", "dns_facts_internal_records_skip": true}
    }))
    .unwrap()
}

fn store(kind: ZoneKind) -> ZoneStore {
    let mut store = ZoneStore::new();
    store.insert("example.com", Zone::new(kind));
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

#[test]
fn test_internal_name_accepts_dotted_parts() {
    let inventory = inventory();
    let host = inventory.host("web1").unwrap();
    let mut directive = directive(false);
    directive.subdomain = ".int.".to_string();
    assert_eq!(internal_name(&host, &directive), "web1.int.example.com");
}

#[test]
fn test_internal_records_for_every_host() {
    let inventory = inventory();
    let mut store = store(ZoneKind::Master);

    synthesize_internal_records(&inventory, &directive(false), &StaticFingerprints::default(), &mut store)
        .unwrap();

    assert_eq!(values(&store, "web1.int.example.com", "A"), vec!["10.0.0.10"]);
    assert_eq!(values(&store, "database1.int.example.com", "A"), vec!["10.0.0.11"]);
    assert!(values(&store, "lab1.int.example.com", "A").is_empty());
}

#[test]
fn test_internal_records_idempotent() {
    let inventory = inventory();
    let fingerprints = StaticFingerprints::default().with("web1", &[(4, 2, "abcd")]);
    let mut store = store(ZoneKind::Native);

    synthesize_internal_records(&inventory, &directive(true), &fingerprints, &mut store).unwrap();
    let first = store.clone();
    synthesize_internal_records(&inventory, &directive(true), &fingerprints, &mut store).unwrap();

    assert_eq!(store, first);
    assert_eq!(values(&store, "web1.int.example.com", "A"), vec!["10.0.0.10"]);
    assert_eq!(values(&store, "web1.int.example.com", "SSHFP"), vec!["4 2 abcd"]);
}

#[test]
fn test_internal_records_never_touch_existing_names() {
    let inventory = inventory();
    let fingerprints = StaticFingerprints::default().with("web1", &[(4, 2, "abcd")]);
    let mut store = store(ZoneKind::Master);
    store.add_record("web1.int.example.com", "TXT", "\"manual\"", Policy::AppendIfAbsent);

    synthesize_internal_records(&inventory, &directive(true), &fingerprints, &mut store).unwrap();

    assert!(values(&store, "web1.int.example.com", "A").is_empty());
    assert!(values(&store, "web1.int.example.com", "SSHFP").is_empty());
}

#[test]
fn test_internal_records_skip_secondary_zones() {
    let inventory = inventory();
    let mut store = store(ZoneKind::Slave);

    synthesize_internal_records(&inventory, &directive(false), &StaticFingerprints::default(), &mut store)
        .unwrap();

    assert!(store.get("example.com").unwrap().records.is_empty());
}

#[test]
fn test_internal_records_filter_fingerprints() {
    let inventory = inventory();
    let fingerprints = StaticFingerprints::default().with(
        "web1",
        &[(1, 1, "aaaa"), (1, 2, "bbbb"), (4, 1, "cccc"), (4, 2, "dddd")],
    );
    let mut directive = directive(true);
    directive.sshfp_algorithms = Some(vec![4]);
    directive.sshfp_fp_types = Some(vec![2]);
    let mut store = store(ZoneKind::Master);

    synthesize_internal_records(&inventory, &directive, &fingerprints, &mut store).unwrap();

    assert_eq!(values(&store, "web1.int.example.com", "SSHFP"), vec!["4 2 dddd"]);
}

#[test]
fn test_internal_records_without_fingerprints() {
    let inventory = inventory();
    let mut store = store(ZoneKind::Master);

    synthesize_internal_records(&inventory, &directive(true), &StaticFingerprints::default(), &mut store)
        .unwrap();

    assert_eq!(values(&store, "web1.int.example.com", "A"), vec!["10.0.0.10"]);
    assert!(values(&store, "web1.int.example.com", "SSHFP").is_empty());
}

#[test]
fn test_internal_records_address_families() {
    let inventory = Inventory::from_value(json!({
        "web1": {"ansible_host": "10.0.0.10"},
        "web6": {"ansible_host": "2001:db8::6"},
        "bare": {}
    }))
    .unwrap();
    let mut store = store(ZoneKind::Native);

    synthesize_internal_records(&inventory, &directive(false), &StaticFingerprints::default(), &mut store)
        .unwrap();

    assert_eq!(values(&store, "web1.int.example.com", "A"), vec!["10.0.0.10"]);
    assert_eq!(values(&store, "web6.int.example.com", "AAAA"), vec!["2001:db8::6"]);
    assert!(values(&store, "web6.int.example.com", "A").is_empty());
    assert!(!store
        .get("example.com")
        .unwrap()
        .records
        .contains_key("bare.int.example.com"));
}
