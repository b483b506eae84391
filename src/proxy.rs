// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reverse-proxy address records
//!
//! Every host may publish the domains it serves in
//! `dns_facts_served_domains`. Each reverse proxy the target lists points
//! those domains at itself, decorated with the proxy's own prefixes and
//! suffixes. A name that already holds an address record of the proxy's
//! family (A or AAAA) is left alone.

use tracing::{debug, info, warn};

use crate::{
    facts::{
        Inventory, ServedDomains, FACT_DOMAIN_PREFIXES, FACT_DOMAIN_SUFFIXES, FACT_IGNORE_HOSTS,
        FACT_SERVED_DOMAINS,
    },
    records::{address_type, emit, PASS_REVERSE_PROXY},
    types::CompileResult,
    zones::{join_labels, Outcome, Policy, ZoneStore},
};

/// Names a proxy publishes for one served domain
///
/// A domain ending in `.` is taken verbatim (without the dot); anything else
/// is expanded to every prefix × suffix combination, empty parts dropped.
pub fn proxy_names(domain: &str, prefixes: &[String], suffixes: &[String]) -> Vec<String> {
    if let Some(verbatim) = domain.strip_suffix('.') {
        return vec![verbatim.to_string()];
    }

    let mut names = Vec::with_capacity(prefixes.len() * suffixes.len());
    for prefix in prefixes {
        for suffix in suffixes {
            let name = join_labels(&[prefix.as_str(), domain, suffix.as_str()]);
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn or_blank(parts: Option<Vec<String>>) -> Vec<String> {
    parts.unwrap_or_else(|| vec![String::new()])
}

/// Address records pointing every served domain at each listed proxy
pub fn synthesize_reverse_proxies(
    inventory: &Inventory,
    proxies: &[String],
    store: &mut ZoneStore,
) -> CompileResult<()> {
    for proxy_id in proxies {
        let proxy = inventory.require_host(proxy_id)?;
        let address = proxy.address()?;
        let prefixes = or_blank(proxy.decode(FACT_DOMAIN_PREFIXES)?);
        let suffixes = or_blank(proxy.decode(FACT_DOMAIN_SUFFIXES)?);
        let ignored: Vec<String> = proxy.decode(FACT_IGNORE_HOSTS)?.unwrap_or_default();
        let rtype = address_type(address);

        let mut inserted = 0;
        for host in inventory.hosts() {
            if ignored.iter().any(|id| id == host.id()) {
                debug!("proxy {} ignores host {}", proxy_id, host.id());
                continue;
            }
            let blocks = match host.decode::<Vec<ServedDomains>>(FACT_SERVED_DOMAINS) {
                Ok(Some(blocks)) => blocks,
                Ok(None) => continue,
                Err(e) => {
                    warn!("skipping served domains of host {}: {}", host.id(), e);
                    continue;
                }
            };

            for block in blocks.iter().filter(|block| !block.reverse_proxy_skip) {
                let Some(domains) = &block.domains else {
                    continue;
                };
                for domain in domains {
                    for name in proxy_names(domain, &prefixes, &suffixes) {
                        let outcome = emit(
                            store,
                            PASS_REVERSE_PROXY,
                            &name,
                            rtype,
                            address,
                            Policy::SkipIfTypeExists,
                        );
                        if outcome == Outcome::Inserted {
                            inserted += 1;
                        }
                    }
                }
            }
        }
        info!("proxy {} published {} names", proxy_id, inserted);
    }
    Ok(())
}
