// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Internal-naming records
//!
//! Every host in the inventory gets `<host>.<subdomain>.<zone>` pointing at
//! its primary address, optionally with SSHFP records for its host keys.
//! Only brand new names are written, and only into zones this host serves
//! as Master or Native.

use tracing::{debug, info, warn};

use crate::{
    facts::{Host, InternalRecordsDirective, Inventory, FACT_INTERNAL_SKIP},
    records::{address_type, emit, tally, PASS_INTERNAL},
    sshfp::{FingerprintSource, Sshfp},
    types::CompileResult,
    zones::{join_labels, Outcome, Policy, ZoneStore, RECORD_TYPE_A, RECORD_TYPE_SSHFP},
};

/// Internal name of `host` under the directive's subdomain and zone
pub fn internal_name(host: &Host<'_>, directive: &InternalRecordsDirective) -> String {
    join_labels(&[
        host.name(),
        directive.subdomain.as_str(),
        directive.zone.as_str(),
    ])
}

fn allowed(fingerprint: &Sshfp, directive: &InternalRecordsDirective) -> bool {
    let algorithm_ok = directive
        .sshfp_algorithms
        .as_ref()
        .map_or(true, |algorithms| algorithms.contains(&fingerprint.algorithm));
    let type_ok = directive
        .sshfp_fp_types
        .as_ref()
        .map_or(true, |types| types.contains(&fingerprint.fp_type));
    algorithm_ok && type_ok
}

/// Address (and SSHFP) records for every host not opted out
pub fn synthesize_internal_records(
    inventory: &Inventory,
    directive: &InternalRecordsDirective,
    fingerprints: &dyn FingerprintSource,
    store: &mut ZoneStore,
) -> CompileResult<()> {
    let mut added = 0;

    for host in inventory.hosts() {
        if host.flag(FACT_INTERNAL_SKIP) {
            debug!("host {} opted out of internal records", host.id());
            continue;
        }

        let name = internal_name(&host, directive);
        let Some(zone_name) = store.resolve(&name).map(str::to_string) else {
            tally(PASS_INTERNAL, &name, RECORD_TYPE_A, "", Outcome::NoZone);
            continue;
        };
        let serves = store
            .get(&zone_name)
            .is_some_and(|zone| zone.is_authoritative());
        if !serves {
            debug!("zone {} is not served as primary, skipping {}", zone_name, name);
            continue;
        }

        let address = match host.address() {
            Ok(address) => address,
            Err(e) => {
                warn!("skipping internal name {}: {}", name, e);
                continue;
            }
        };
        if emit(
            store,
            PASS_INTERNAL,
            &name,
            address_type(address),
            address,
            Policy::SkipIfNameExists,
        ) != Outcome::Inserted
        {
            continue;
        }
        added += 1;

        if !directive.generate_sshfp {
            continue;
        }
        for fingerprint in fingerprints.fingerprints(host.id())? {
            if !allowed(&fingerprint, directive) {
                debug!(
                    "filtered SSHFP {} for {}",
                    fingerprint.to_rdata(),
                    host.id()
                );
                continue;
            }
            emit(
                store,
                PASS_INTERNAL,
                &name,
                RECORD_TYPE_SSHFP,
                &fingerprint.to_rdata(),
                Policy::AppendIfAbsent,
            );
        }
    }

    info!(
        "added {} internal names under {}",
        added,
        join_labels(&[directive.subdomain.as_str(), directive.zone.as_str()])
    );
    Ok(())
}
