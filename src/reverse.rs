// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reverse pointer records
//!
//! Every IPv4 address a host carries (primary, interfaces, bridges) gets a
//! PTR back to `<host>.<suffix>.` when this host serves the matching /24
//! reverse zone. An existing PTR is never overwritten, so a stale pointer
//! survives an address change until it is removed by hand.

use std::net::Ipv4Addr;
use tracing::info;

use crate::{
    facts::Inventory,
    records::{tally, PASS_REVERSE_PTR},
    zones::{absolute, join_labels, Outcome, Policy, ZoneStore, RECORD_TYPE_PTR},
};

/// `d.c.b.a.in-addr.arpa` for address `a.b.c.d`
pub fn reverse_name(address: Ipv4Addr) -> String {
    let [a, b, c, d] = address.octets();
    format!("{}.{}.{}.{}.in-addr.arpa", d, c, b, a)
}

/// `c.b.a.in-addr.arpa`, the /24 reverse zone holding `a.b.c.d`
pub fn reverse_zone(address: Ipv4Addr) -> String {
    let [a, b, c, _] = address.octets();
    format!("{}.{}.{}.in-addr.arpa", c, b, a)
}

/// PTR records for every host address whose reverse zone is held here
pub fn synthesize_reverse_pointers(inventory: &Inventory, suffix: &str, store: &mut ZoneStore) {
    let mut added = 0;

    for host in inventory.hosts() {
        let target = absolute(&join_labels(&[host.name(), suffix]));

        for address in host.ipv4_addresses() {
            let zone = reverse_zone(address);
            let name = reverse_name(address);
            let outcome = if store.contains(&zone) {
                store.add_to_zone(&zone, &name, RECORD_TYPE_PTR, &target, Policy::SkipIfTypeExists)
            } else {
                Outcome::NoZone
            };
            tally(PASS_REVERSE_PTR, &name, RECORD_TYPE_PTR, &target, outcome);
            if outcome == Outcome::Inserted {
                added += 1;
            }
        }
    }

    info!("added {} reverse pointers", added);
}
