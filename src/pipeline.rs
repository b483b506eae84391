// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The compile pipeline
//!
//! A [`Compiler`] owns nothing but borrowed, read-only inputs. Each call to
//! [`Compiler::compile`] builds a fresh [`ZoneStore`] from the target host's
//! declared zones and threads it through every stage in order. Later stages
//! rely on records written by earlier ones (prefix expansion and reverse
//! pointers look at address records, for instance), so the order below is
//! fixed.
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use zonefacts::{facts::Inventory, pipeline::Compiler, sshfp::FingerprintDir};
//!
//! let inventory = Inventory::from_value(json!({
//!     "host-a": {
//!         "ansible_host": "10.0.0.1",
//!         "pdns_auth_api_zones": {"example.com": {"kind": "Native"}},
//!         "dns_facts_my_records": ["www.example.com"]
//!     }
//! })).unwrap();
//!
//! let fingerprints = FingerprintDir::default();
//! let zones = Compiler::new(&inventory, "host-a", &fingerprints).compile().unwrap();
//! assert!(zones["example.com"].records.contains_key("www.example.com"));
//! ```

use std::time::Instant;
use tracing::{debug, info};

use crate::{
    clone,
    facts::{Directives, Inventory},
    generate, internal, metrics, proxy, records, reverse, secondary,
    sshfp::FingerprintSource,
    types::CompileResult,
    zones::{ZoneSet, ZoneStore},
};

/// Compiles the zone set of one target host
pub struct Compiler<'a> {
    inventory: &'a Inventory,
    target: &'a str,
    fingerprints: &'a dyn FingerprintSource,
}

impl<'a> Compiler<'a> {
    pub fn new(
        inventory: &'a Inventory,
        target: &'a str,
        fingerprints: &'a dyn FingerprintSource,
    ) -> Self {
        Self {
            inventory,
            target,
            fingerprints,
        }
    }

    pub fn target(&self) -> &str {
        self.target
    }

    /// Run every stage and return the finished zone set
    ///
    /// Any error aborts the run; no partial zone set is ever returned.
    pub fn compile(&self) -> CompileResult<ZoneSet> {
        let start = Instant::now();
        let inventory = self.inventory;

        let host = inventory.require_host(self.target)?;
        let directives = Directives::from_host(&host)?;

        let mut store = ZoneStore::from_zones(host.zones()?.unwrap_or_default());
        info!(
            "compiling {} with {} declared zones across {} hosts",
            self.target,
            store.len(),
            inventory.len()
        );

        debug!("stage: zone clones");
        clone::expand_clones(&mut store, &directives.zone_clones)?;

        debug!("stage: host records");
        records::synthesize_host_records(inventory, &mut store)?;

        debug!("stage: mail exchangers");
        records::synthesize_mail_exchangers(inventory, &directives.mx_servers, &mut store)?;
        records::synthesize_spf(inventory, &directives.mx_servers, &mut store)?;

        debug!("stage: reverse proxies");
        proxy::synthesize_reverse_proxies(inventory, &directives.reverse_proxies, &mut store)?;

        if let Some(internal_records) = &directives.internal_records {
            debug!("stage: internal records");
            internal::synthesize_internal_records(
                inventory,
                internal_records,
                self.fingerprints,
                &mut store,
            )?;
        }

        debug!("stage: generate");
        generate::expand_generate(&directives.generate, &mut store)?;

        debug!("stage: prefixes");
        records::expand_prefixes(&directives.prefix, &mut store);

        debug!("stage: forward records");
        records::synthesize_forward_records(inventory, &directives.forward_records, &mut store)?;

        if let Some(suffix) = &directives.reverse_suffix {
            debug!("stage: reverse pointers");
            reverse::synthesize_reverse_pointers(inventory, suffix, &mut store);
        }

        debug!("stage: post-passes");
        records::add_null_mx(&mut store);
        records::quote_txt_records(&mut store);

        if !directives.primary_servers.is_empty() {
            debug!("stage: secondaries");
            secondary::infer_secondaries(
                inventory,
                &directives.primary_servers,
                directives.secondary_name.as_deref(),
                &mut store,
            );
        }

        let removed = clone::remove_templates(&mut store);
        if removed > 0 {
            info!("dropped {} template zones", removed);
        }

        let zones = store.into_zones();
        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_compile(&zones, elapsed);
        info!(
            "compiled {} zones for {} in {:.3}s",
            zones.len(),
            self.target,
            elapsed
        );

        Ok(zones)
    }
}
