// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secondary zone inference
//!
//! The target lists its primaries in `dns_facts_primary_servers` and the name
//! it answers to in `dns_facts_secondary_name`. Each primary's own compiled
//! zone set is scanned:
//! - a Master/Native zone whose apex NS set names this host becomes a Slave
//!   zone replicated from that primary
//! - a zone the primary itself only replicates is replicated from the same
//!   masters
//!
//! Primaries missing from the inventory or without zone data are skipped.

use tracing::{debug, info, warn};

use crate::{
    facts::{Host, Inventory},
    metrics,
    zones::{Zone, ZoneKind, ZoneStore, RECORD_TYPE_NS},
};

/// Metrics source label for zones found through an NS match
pub const SOURCE_NS_MATCH: &str = "ns_match";
/// Metrics source label for zones replicated from a primary's own secondaries
pub const SOURCE_PEER_SLAVE: &str = "peer_slave";

fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Whether the zone's apex NS set names `secondary_name`
pub fn lists_nameserver(zone_name: &str, zone: &Zone, secondary_name: &str) -> bool {
    zone.records
        .get(zone_name)
        .and_then(|types| types.get(RECORD_TYPE_NS))
        .is_some_and(|values| {
            values
                .iter()
                .any(|rdata| same_name(&rdata.content, secondary_name))
        })
}

/// Secondary zones this host should carry for one primary
///
/// Returns `(zone name, zone, source label)`.
pub fn secondaries_from(
    primary: &Host<'_>,
    secondary_name: Option<&str>,
) -> Vec<(String, Zone, &'static str)> {
    let zones = match primary.zones() {
        Ok(Some(zones)) => zones,
        Ok(None) => {
            debug!("primary {} has no zone data", primary.id());
            return Vec::new();
        }
        Err(e) => {
            warn!("skipping primary {}: {}", primary.id(), e);
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for (name, zone) in &zones {
        match zone.effective_kind() {
            ZoneKind::Slave => match &zone.masters {
                Some(masters) if !masters.is_empty() => {
                    found.push((name.clone(), Zone::slave(masters.clone()), SOURCE_PEER_SLAVE));
                }
                _ => warn!("slave zone {} on {} has no masters", name, primary.id()),
            },
            kind if kind.is_authoritative() => {
                let Some(secondary_name) = secondary_name else {
                    continue;
                };
                if !lists_nameserver(name, zone, secondary_name) {
                    continue;
                }
                match primary.master_address() {
                    Ok(address) => found.push((
                        name.clone(),
                        Zone::slave(vec![address.to_string()]),
                        SOURCE_NS_MATCH,
                    )),
                    Err(e) => warn!("cannot replicate {} from {}: {}", name, primary.id(), e),
                }
            }
            _ => {}
        }
    }
    found
}

/// Register a Slave zone for everything the primaries expect this host to carry
pub fn infer_secondaries(
    inventory: &Inventory,
    primaries: &[String],
    secondary_name: Option<&str>,
    store: &mut ZoneStore,
) {
    let mut registered = 0;

    for primary_id in primaries {
        let Some(primary) = inventory.host(primary_id) else {
            warn!("primary {} is not in the inventory", primary_id);
            continue;
        };

        for (name, zone, source) in secondaries_from(&primary, secondary_name) {
            if let Some(existing) = store.get(&name) {
                if existing.effective_kind() != ZoneKind::Slave {
                    warn!(
                        "zone {} is declared as {} here, not replicating it from {}",
                        name,
                        existing.effective_kind().as_str(),
                        primary_id
                    );
                    continue;
                }
            }
            debug!("secondary zone {} from {} ({})", name, primary_id, source);
            store.insert(name, zone);
            metrics::record_secondary(source);
            registered += 1;
        }
    }

    info!("registered {} secondary zones", registered);
}
