// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record synthesis passes
//!
//! This module implements the passes that turn host declarations into
//! records:
//! - Host address records and their CNAME trees
//! - Mail exchangers and the SPF record of the first mail server
//! - Prefixed aliases of known addresses
//! - Records named after a host attribute
//! - Null MX (RFC 7505) for names that hold addresses but no mail exchanger
//! - TXT quoting
//!
//! Every insertion is resolved to its owning zone by longest suffix; a name
//! no zone owns is skipped silently.

use serde_json::Value;
use std::collections::BTreeMap;
use std::net::Ipv6Addr;
use tracing::{debug, info, warn};

use crate::{
    facts::{
        CnameRecord, ForwardRecordDirective, HostRecord, Inventory, MxName, NameSpec,
        FACT_MX_MY_NAME, FACT_MX_NAMES, FACT_MX_PRIO, FACT_MX_SPF, FACT_MY_RECORDS,
    },
    metrics,
    types::{CompileError, CompileResult},
    zones::{
        absolute, is_within, join_labels, Outcome, Policy, RData, ZoneStore, RECORD_TYPE_A,
        RECORD_TYPE_AAAA, RECORD_TYPE_CNAME, RECORD_TYPE_MX, RECORD_TYPE_TXT,
    },
};

/// Pass names used in logs and metrics
pub const PASS_HOST_RECORDS: &str = "host_records";
pub const PASS_MAIL_EXCHANGE: &str = "mail_exchange";
pub const PASS_SPF: &str = "spf";
pub const PASS_PREFIX: &str = "prefix";
pub const PASS_FORWARD: &str = "forward";
pub const PASS_REVERSE_PROXY: &str = "reverse_proxy";
pub const PASS_INTERNAL: &str = "internal";
pub const PASS_GENERATE: &str = "generate";
pub const PASS_REVERSE_PTR: &str = "reverse_ptr";
pub const PASS_NULL_MX: &str = "null_mx";
pub const PASS_TXT_QUOTE: &str = "txt_quote";

/// Priority used when neither the mail name nor the server gives one
pub const DEFAULT_MX_PRIO: u16 = 10;

/// Null MX content (RFC 7505)
pub const NULL_MX: &str = "0 .";

/// Log and count one insertion outcome
pub(crate) fn tally(pass: &str, name: &str, rtype: &str, content: &str, outcome: Outcome) {
    match outcome {
        Outcome::NoZone => debug!("{}: no zone owns {}, dropping {} {}", pass, name, rtype, content),
        _ => debug!(
            "{}: {} {} {} {}",
            pass,
            outcome.as_str(),
            name,
            rtype,
            content
        ),
    }
    metrics::record_synthesis(pass, outcome);
}

/// Insert into the owning zone, logging and counting the outcome
pub(crate) fn emit(
    store: &mut ZoneStore,
    pass: &str,
    name: &str,
    rtype: &str,
    content: &str,
    policy: Policy,
) -> Outcome {
    let outcome = store.add_record(name, rtype, content, policy);
    tally(pass, name, rtype, content, outcome);
    outcome
}

/// A for IPv4 literals (and anything unparsable), AAAA for IPv6 literals
pub fn address_type(address: &str) -> &'static str {
    if address.parse::<Ipv6Addr>().is_ok() {
        RECORD_TYPE_AAAA
    } else {
        RECORD_TYPE_A
    }
}

/// Wrap TXT content in double quotes unless it already is
pub fn quote_txt(content: &str) -> String {
    if content.len() >= 2 && content.starts_with('"') && content.ends_with('"') {
        content.to_string()
    } else {
        format!("\"{}\"", content)
    }
}

// ========== Host Records ==========

/// Address records and CNAME trees from every host's `dns_facts_my_records`
///
/// A host whose declaration cannot be decoded is skipped with a warning; it
/// does not stop the other hosts' records.
pub fn synthesize_host_records(inventory: &Inventory, store: &mut ZoneStore) -> CompileResult<()> {
    for host in inventory.hosts() {
        let entries = match host.decode::<Vec<NameSpec<HostRecord>>>(FACT_MY_RECORDS) {
            Ok(Some(entries)) => entries,
            Ok(None) => continue,
            Err(e) => {
                warn!("skipping records of host {}: {}", host.id(), e);
                continue;
            }
        };

        for entry in &entries {
            let (ip, cnames) = match entry {
                NameSpec::Bare(_) => (None, &[][..]),
                NameSpec::Detailed(record) => (record.ip.as_deref(), record.cnames.as_slice()),
            };
            let ip = match ip.map_or_else(|| host.address(), Ok) {
                Ok(ip) => ip,
                Err(e) => {
                    warn!("skipping {} of host {}: {}", entry.name(), host.id(), e);
                    continue;
                }
            };

            emit(
                store,
                PASS_HOST_RECORDS,
                entry.name(),
                address_type(ip),
                ip,
                Policy::AppendIfAbsent,
            );
            add_cnames(store, entry.name(), cnames);
        }
    }
    Ok(())
}

/// Depth first; each alias points at its enclosing name unless told otherwise
fn add_cnames(store: &mut ZoneStore, enclosing: &str, cnames: &[NameSpec<CnameRecord>]) {
    for cname in cnames {
        let (target, nested) = match cname {
            NameSpec::Bare(_) => (None, &[][..]),
            NameSpec::Detailed(record) => (record.target.as_deref(), record.cnames.as_slice()),
        };
        let target = absolute(target.unwrap_or(enclosing));

        emit(
            store,
            PASS_HOST_RECORDS,
            cname.name(),
            RECORD_TYPE_CNAME,
            &target,
            Policy::AppendIfAbsent,
        );
        add_cnames(store, cname.name(), nested);
    }
}

// ========== Mail ==========

fn mx_names(inventory: &Inventory, server_id: &str) -> CompileResult<Vec<NameSpec<MxName>>> {
    let server = inventory.require_host(server_id)?;
    Ok(server.decode(FACT_MX_NAMES)?.unwrap_or_default())
}

/// MX records for every name each listed mail server handles
pub fn synthesize_mail_exchangers(
    inventory: &Inventory,
    mx_servers: &[String],
    store: &mut ZoneStore,
) -> CompileResult<()> {
    for server_id in mx_servers {
        let server = inventory.require_host(server_id)?;
        let my_name: String = server.decode(FACT_MX_MY_NAME)?.ok_or_else(|| {
            CompileError::fact(server_id, FACT_MX_MY_NAME, "required for mail servers")
        })?;
        let default_prio: u16 = server.decode(FACT_MX_PRIO)?.unwrap_or(DEFAULT_MX_PRIO);
        let exchange = absolute(&my_name);

        for name in mx_names(inventory, server_id)? {
            let prio = name
                .detail()
                .and_then(|detail| detail.prio)
                .unwrap_or(default_prio);
            emit(
                store,
                PASS_MAIL_EXCHANGE,
                name.name(),
                RECORD_TYPE_MX,
                &format!("{} {}", prio, exchange),
                Policy::AppendIfAbsent,
            );
        }
    }
    Ok(())
}

fn is_spf(content: &str) -> bool {
    content.trim_start_matches('"').starts_with("v=spf1")
}

/// The first mail server's SPF string, applied to every mail name
pub fn synthesize_spf(
    inventory: &Inventory,
    mx_servers: &[String],
    store: &mut ZoneStore,
) -> CompileResult<()> {
    let Some(first) = mx_servers.first() else {
        return Ok(());
    };
    let Some(spf) = inventory.require_host(first)?.decode::<String>(FACT_MX_SPF)? else {
        return Ok(());
    };
    let spf = quote_txt(&spf);

    for server_id in mx_servers {
        for name in mx_names(inventory, server_id)? {
            let outcome = set_spf(store, name.name(), &spf);
            tally(PASS_SPF, name.name(), RECORD_TYPE_TXT, &spf, outcome);
        }
    }
    Ok(())
}

/// Update an existing SPF TXT value in place, or append one
fn set_spf(store: &mut ZoneStore, name: &str, spf: &str) -> Outcome {
    let name = name.trim_end_matches('.');
    let Some(zone_name) = store.resolve(name).map(str::to_string) else {
        return Outcome::NoZone;
    };
    let Some(zone) = store.get_mut(&zone_name) else {
        return Outcome::NoZone;
    };

    if let Some(existing) = zone
        .records
        .get_mut(name)
        .and_then(|types| types.get_mut(RECORD_TYPE_TXT))
        .and_then(|values| values.iter_mut().find(|rdata| is_spf(&rdata.content)))
    {
        if existing.content == spf {
            return Outcome::Skipped;
        }
        existing.content = spf.to_string();
        return Outcome::Inserted;
    }

    zone.insert_record(name, RECORD_TYPE_TXT, spf, Policy::AppendIfAbsent)
}

// ========== Prefixes ==========

/// Prefixed aliases for every A record holding a configured address
///
/// A record without an A value is not a candidate. A prefixed name is only
/// added when nothing exists there yet and the original name does not
/// already carry the prefix.
pub fn expand_prefixes(prefixes: &BTreeMap<String, Vec<String>>, store: &mut ZoneStore) {
    if prefixes.is_empty() {
        return;
    }

    let mut candidates = Vec::new();
    for (_, zone) in store.iter() {
        for (name, types) in &zone.records {
            let Some(addresses) = types.get(RECORD_TYPE_A) else {
                continue;
            };
            for rdata in addresses {
                let Some(extra) = prefixes.get(&rdata.content) else {
                    continue;
                };
                for prefix in extra {
                    if name.starts_with(&format!("{}.", prefix)) {
                        continue;
                    }
                    let prefixed = join_labels(&[prefix.as_str(), name.as_str()]);
                    if store.contains_name(&prefixed) {
                        continue;
                    }
                    candidates.push((prefixed, rdata.content.clone()));
                }
            }
        }
    }

    for (name, address) in candidates {
        emit(
            store,
            PASS_PREFIX,
            &name,
            RECORD_TYPE_A,
            &address,
            Policy::AppendIfAbsent,
        );
    }
}

// ========== Forward Records ==========

fn carries(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

/// `<attribute>.<zone>` for hosts carrying the attribute
///
/// Hosts are visited in id order and each one replaces the previous value,
/// so the last carrying host wins.
pub fn synthesize_forward_records(
    inventory: &Inventory,
    directives: &[ForwardRecordDirective],
    store: &mut ZoneStore,
) -> CompileResult<()> {
    for directive in directives {
        let zones: Vec<String> = store
            .iter()
            .filter(|(name, zone)| {
                zone.is_authoritative()
                    && directive
                        .zones
                        .iter()
                        .any(|suffix| is_within(name, suffix.trim_end_matches('.')))
            })
            .map(|(name, _)| name.clone())
            .collect();

        for host in inventory.hosts() {
            if !carries(host.fact(&directive.attribute)) {
                continue;
            }
            let ip = match directive.ip.as_deref().map_or_else(|| host.address(), Ok) {
                Ok(ip) => ip,
                Err(e) => {
                    warn!("skipping {} for host {}: {}", directive.attribute, host.id(), e);
                    continue;
                }
            };

            for zone in &zones {
                let name = join_labels(&[directive.attribute.as_str(), zone.as_str()]);
                let rtype = address_type(ip);
                let outcome = store.add_to_zone(zone, &name, rtype, ip, Policy::Replace);
                tally(PASS_FORWARD, &name, rtype, ip, outcome);
            }
        }
    }
    Ok(())
}

// ========== Post-passes ==========

/// Add `MX 0 .` to every name holding an address but no mail exchanger
pub fn add_null_mx(store: &mut ZoneStore) {
    let mut added = 0;
    for (_, zone) in store.iter_mut() {
        for (name, types) in zone.records.iter_mut() {
            let has_address =
                types.contains_key(RECORD_TYPE_A) || types.contains_key(RECORD_TYPE_AAAA);
            if has_address && !types.contains_key(RECORD_TYPE_MX) {
                types.insert(RECORD_TYPE_MX.to_string(), vec![RData::new(NULL_MX)]);
                tally(PASS_NULL_MX, name, RECORD_TYPE_MX, NULL_MX, Outcome::Inserted);
                added += 1;
            }
        }
    }
    info!("added {} null MX records", added);
}

/// Quote every unquoted TXT value
pub fn quote_txt_records(store: &mut ZoneStore) {
    for (_, zone) in store.iter_mut() {
        for (name, types) in zone.records.iter_mut() {
            let Some(values) = types.get_mut(RECORD_TYPE_TXT) else {
                continue;
            };
            for rdata in values.iter_mut() {
                let quoted = quote_txt(&rdata.content);
                if quoted != rdata.content {
                    debug!("{}: quoting TXT at {}", PASS_TXT_QUOTE, name);
                    rdata.content = quoted;
                }
            }
        }
    }
}
