// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for reverse pointer records

use super::reverse::*;
use crate::facts::Inventory;
use crate::zones::{Zone, ZoneKind, ZoneStore};
use serde_json::json;
use std::net::Ipv4Addr;

fn ptr(store: &ZoneStore, zone: &str, name: &str) -> Vec<String> {
    store
        .get(zone)
        .and_then(|zone| zone.records.get(name))
        .and_then(|types| types.get("PTR"))
        .map(|values| values.iter().map(|rdata| rdata.content.clone()).collect())
        .unwrap_or_default()
}

fn reverse_store() -> ZoneStore {
    let mut store = ZoneStore::new();
    store.insert("0.0.10.in-addr.arpa", Zone::new(ZoneKind::Master));
    store.insert("1.168.192.in-addr.arpa", Zone::new(ZoneKind::Master));
    store
}

#[test]
fn test_reverse_names() {
    let address: Ipv4Addr = "10.0.0.42".parse().unwrap();
    assert_eq!(reverse_name(address), "42.0.0.10.in-addr.arpa");
    assert_eq!(reverse_zone(address), "0.0.10.in-addr.arpa");
}

#[test]
fn test_reverse_pointers_for_all_addresses() {
    let inventory = Inventory::from_value(json!({
        "router": {
            "ansible_host": "10.0.0.1",
            "ansible_interfaces": ["lo", "br-lan", "eth1"],
            "ansible_lo": {"ipv4": {"address": "127.0.0.1"}},
            "ansible_br_lan": {
                "ipv4": {"address": "192.168.1.1"},
                "ipv4_secondaries": [{"address": "192.168.1.254"}]
            },
            "ansible_eth1": {"ipv4": {"address": "172.16.0.1"}}
        }
    }))
    .unwrap();
    let mut store = reverse_store();

    synthesize_reverse_pointers(&inventory, "int.example.com", &mut store);

    assert_eq!(
        ptr(&store, "0.0.10.in-addr.arpa", "1.0.0.10.in-addr.arpa"),
        vec!["router.int.example.com."]
    );
    assert_eq!(
        ptr(&store, "1.168.192.in-addr.arpa", "1.1.168.192.in-addr.arpa"),
        vec!["router.int.example.com."]
    );
    assert_eq!(
        ptr(&store, "1.168.192.in-addr.arpa", "254.1.168.192.in-addr.arpa"),
        vec!["router.int.example.com."]
    );
    // no reverse zone for 172.16.0.0/24
    assert_eq!(store.len(), 2);
}

#[test]
fn test_reverse_pointers_create_if_absent() {
    let before = Inventory::from_value(json!({
        "web1": {"ansible_host": "10.0.0.10"},
        "web2": {"ansible_host": "10.0.0.11"}
    }))
    .unwrap();
    // web2 took over web1's old address
    let after = Inventory::from_value(json!({
        "web1": {"ansible_host": "10.0.0.12"},
        "web2": {"ansible_host": "10.0.0.10"}
    }))
    .unwrap();
    let mut store = reverse_store();

    synthesize_reverse_pointers(&before, "int.example.com", &mut store);
    synthesize_reverse_pointers(&after, "int.example.com", &mut store);

    let zone = "0.0.10.in-addr.arpa";
    assert_eq!(ptr(&store, zone, "10.0.0.10.in-addr.arpa"), vec!["web1.int.example.com."]);
    assert_eq!(ptr(&store, zone, "11.0.0.10.in-addr.arpa"), vec!["web2.int.example.com."]);
    assert_eq!(ptr(&store, zone, "12.0.0.10.in-addr.arpa"), vec!["web1.int.example.com."]);
}
