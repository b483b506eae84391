// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inventory facts and compiler directives
//!
//! The input document is a mapping of host id → facts (an Ansible `hostvars`
//! dump). Hosts are only ever read. Directives are decoded into typed
//! structures once, at this boundary, so the compiler stages never inspect
//! raw JSON shapes.
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use zonefacts::facts::{Directives, Inventory};
//!
//! let inventory = Inventory::from_value(json!({
//!     "ns1": {
//!         "ansible_host": "10.0.0.1",
//!         "dns_facts_secondary_name": "ns1.example.com.",
//!         "dns_facts_primary_servers": ["ns0"]
//!     }
//! })).unwrap();
//!
//! let host = inventory.require_host("ns1").unwrap();
//! let directives = Directives::from_host(&host).unwrap();
//! assert_eq!(directives.primary_servers, vec!["ns0".to_string()]);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::types::{CompileError, CompileResult};
use crate::zones::{TypeMap, ZoneSet};

/// Well-known host facts
pub const FACT_ADDRESS: &str = "ansible_host";
pub const FACT_HOSTNAME: &str = "inventory_hostname";
pub const FACT_INTERFACES: &str = "ansible_interfaces";
pub const FACT_ZONES: &str = "pdns_auth_api_zones";
pub const FACT_DNS_IPV4: &str = "dns_facts_dns_ipv4";

/// Per-host facts read by the record synthesizers
pub const FACT_MY_RECORDS: &str = "dns_facts_my_records";
pub const FACT_MX_MY_NAME: &str = "dns_facts_mx_my_name";
pub const FACT_MX_NAMES: &str = "dns_facts_mx_names";
pub const FACT_MX_PRIO: &str = "dns_facts_mx_prio";
pub const FACT_MX_SPF: &str = "dns_facts_mx_spf";
pub const FACT_DOMAIN_PREFIXES: &str = "dns_facts_domain_prefixes";
pub const FACT_DOMAIN_SUFFIXES: &str = "dns_facts_domain_suffixes";
pub const FACT_IGNORE_HOSTS: &str = "dns_facts_ignore_hosts";
pub const FACT_SERVED_DOMAINS: &str = "dns_facts_served_domains";
pub const FACT_INTERNAL_SKIP: &str = "dns_facts_internal_records_skip";

/// Facts of one host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostFacts(Map<String, Value>);

impl HostFacts {
    pub fn new(facts: Map<String, Value>) -> Self {
        Self(facts)
    }

    pub fn get(&self, fact: &str) -> Option<&Value> {
        self.0.get(fact)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Every host in the fleet, keyed by host id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    hosts: BTreeMap<String, HostFacts>,
}

impl Inventory {
    pub fn from_value(value: Value) -> CompileResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(input: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn host(&self, id: &str) -> Option<Host<'_>> {
        self.hosts
            .get_key_value(id)
            .map(|(id, facts)| Host { id, facts })
    }

    /// Look up a host that a directive refers to; absence is a config error
    pub fn require_host(&self, id: &str) -> CompileResult<Host<'_>> {
        self.host(id)
            .ok_or_else(|| CompileError::config(format!("host {} is not in the inventory", id)))
    }

    /// All hosts in host-id order
    pub fn hosts(&self) -> impl Iterator<Item = Host<'_>> {
        self.hosts.iter().map(|(id, facts)| Host { id, facts })
    }
}

/// Read-only view of one inventory host
#[derive(Debug, Clone, Copy)]
pub struct Host<'a> {
    id: &'a str,
    facts: &'a HostFacts,
}

impl<'a> Host<'a> {
    pub fn id(&self) -> &'a str {
        self.id
    }

    pub fn fact(&self, fact: &str) -> Option<&'a Value> {
        self.facts.get(fact)
    }

    /// Host name used in synthesized records
    pub fn name(&self) -> &'a str {
        self.fact(FACT_HOSTNAME)
            .and_then(Value::as_str)
            .unwrap_or(self.id)
    }

    /// Primary address
    pub fn address(&self) -> CompileResult<&'a str> {
        match self.fact(FACT_ADDRESS) {
            Some(Value::String(address)) => Ok(address),
            Some(_) => Err(CompileError::fact(self.id, FACT_ADDRESS, "expected a string")),
            None => Err(CompileError::fact(self.id, FACT_ADDRESS, "fact is missing")),
        }
    }

    /// Address this host advertises as a DNS primary
    pub fn master_address(&self) -> CompileResult<&'a str> {
        match self.fact(FACT_DNS_IPV4).and_then(Value::as_str) {
            Some(address) => Ok(address),
            None => self.address(),
        }
    }

    /// True only when the fact is literally `true`
    pub fn flag(&self, fact: &str) -> bool {
        matches!(self.fact(fact), Some(Value::Bool(true)))
    }

    /// Decode an optional fact into a typed value
    ///
    /// A missing or null fact is `None`; a fact of the wrong shape is an
    /// error naming the host and fact.
    pub fn decode<T: DeserializeOwned>(&self, fact: &str) -> CompileResult<Option<T>> {
        match self.fact(fact) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| CompileError::fact(self.id, fact, e.to_string())),
        }
    }

    /// Zones declared for (or compiled for) this host
    pub fn zones(&self) -> CompileResult<Option<ZoneSet>> {
        self.decode(FACT_ZONES)
    }

    /// Primary address plus interface and bridge IPv4 addresses
    ///
    /// Loopback and non-IPv4 values are dropped; each address appears once.
    pub fn ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        let mut addresses = Vec::new();
        let mut push = |candidate: Option<&str>| {
            if let Some(address) = candidate.and_then(|s| s.parse::<Ipv4Addr>().ok()) {
                if !address.is_loopback() && !addresses.contains(&address) {
                    addresses.push(address);
                }
            }
        };

        push(self.fact(FACT_ADDRESS).and_then(Value::as_str));

        if let Some(Value::Array(interfaces)) = self.fact(FACT_INTERFACES) {
            for interface in interfaces.iter().filter_map(Value::as_str) {
                // ansible exposes br-lan as ansible_br_lan
                let key = format!(
                    "ansible_{}",
                    interface.replace(|c: char| c == '-' || c == '.', "_")
                );
                let Some(details) = self.fact(&key) else {
                    continue;
                };
                push(details.pointer("/ipv4/address").and_then(Value::as_str));
                if let Some(Value::Array(secondaries)) = details.get("ipv4_secondaries") {
                    for secondary in secondaries {
                        push(secondary.get("address").and_then(Value::as_str));
                    }
                }
            }
        }

        addresses
    }
}

/// A name given either bare or with extra options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NameSpec<D> {
    Bare(String),
    Detailed(D),
}

/// Detailed entries carry their own name
pub trait Named {
    fn name(&self) -> &str;
}

impl<D: Named> NameSpec<D> {
    pub fn name(&self) -> &str {
        match self {
            NameSpec::Bare(name) => name,
            NameSpec::Detailed(detail) => detail.name(),
        }
    }

    pub fn detail(&self) -> Option<&D> {
        match self {
            NameSpec::Bare(_) => None,
            NameSpec::Detailed(detail) => Some(detail),
        }
    }
}

/// Entry of a host's `dns_facts_my_records`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostRecord {
    pub name: String,
    /// Address, defaults to the host's own
    pub ip: Option<String>,
    #[serde(default)]
    pub cnames: Vec<NameSpec<CnameRecord>>,
}

impl Named for HostRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Alias pointing at its enclosing name unless `target` is given
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CnameRecord {
    pub name: String,
    pub target: Option<String>,
    #[serde(default)]
    pub cnames: Vec<NameSpec<CnameRecord>>,
}

impl Named for CnameRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Mail domain handled by an MX server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MxName {
    pub name: String,
    pub prio: Option<u16>,
}

impl Named for MxName {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Block of a host's `dns_facts_served_domains`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServedDomains {
    pub domains: Option<Vec<String>>,
    #[serde(default)]
    pub reverse_proxy_skip: bool,
}

/// Zone derived from another one
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloneDirective {
    #[serde(rename = "zone")]
    pub source_zone: String,
    /// Records whose name contains any of these are dropped
    #[serde(rename = "exclude_records", default)]
    pub exclude_patterns: Vec<String>,
}

/// Per-host names under an internal subdomain
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InternalRecordsDirective {
    #[serde(alias = "subdomain_to_insert")]
    pub subdomain: String,
    #[serde(alias = "domain_append")]
    pub zone: String,
    #[serde(default)]
    pub generate_sshfp: bool,
    /// Allowed SSHFP algorithm codes, all when absent
    pub sshfp_algorithms: Option<Vec<u8>>,
    /// Allowed SSHFP fingerprint type codes, all when absent
    pub sshfp_fp_types: Option<Vec<u8>>,
}

/// Record body of a generate template
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordTemplate {
    Single(TypeMap),
    Multiple(Vec<TypeMap>),
}

impl RecordTemplate {
    /// Flatten into one type map, concatenating values of repeated types
    pub fn to_type_map(&self) -> TypeMap {
        match self {
            RecordTemplate::Single(types) => types.clone(),
            RecordTemplate::Multiple(parts) => {
                let mut merged = TypeMap::new();
                for part in parts {
                    for (rtype, values) in part {
                        merged
                            .entry(rtype.clone())
                            .or_default()
                            .extend(values.iter().cloned());
                    }
                }
                merged
            }
        }
    }
}

/// Records named after a host attribute
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForwardRecordDirective {
    /// Fact name hosts must carry; also the record label
    pub attribute: String,
    /// Fixed address, defaults to the carrying host's address
    pub ip: Option<String>,
    /// Zone suffixes the record goes into
    pub zones: Vec<String>,
}

/// Directives declared on the target host
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Directives {
    #[serde(rename = "dns_facts_zone_clones", default)]
    pub zone_clones: BTreeMap<String, CloneDirective>,

    #[serde(rename = "dns_facts_mx_servers", default)]
    pub mx_servers: Vec<String>,

    #[serde(rename = "dns_facts_reverse_proxies", default)]
    pub reverse_proxies: Vec<String>,

    #[serde(rename = "dns_facts_internal_records")]
    pub internal_records: Option<InternalRecordsDirective>,

    /// zone → "start-end" → name template → records
    #[serde(rename = "dns_facts_generate", default)]
    pub generate: BTreeMap<String, BTreeMap<String, BTreeMap<String, RecordTemplate>>>,

    /// address → extra name prefixes
    #[serde(rename = "dns_facts_prefix", default)]
    pub prefix: BTreeMap<String, Vec<String>>,

    #[serde(rename = "dns_facts_forward_records", default)]
    pub forward_records: Vec<ForwardRecordDirective>,

    #[serde(rename = "dns_facts_reverse_suffix")]
    pub reverse_suffix: Option<String>,

    #[serde(rename = "dns_facts_primary_servers", default)]
    pub primary_servers: Vec<String>,

    #[serde(rename = "dns_facts_secondary_name")]
    pub secondary_name: Option<String>,
}

impl Directives {
    /// Decode the target host's directives
    ///
    /// A directive set to `null` (an Ansible var declared without a value)
    /// counts as absent, like any other fact read through [`Host::decode`].
    pub fn from_host(host: &Host<'_>) -> CompileResult<Self> {
        let facts: Map<String, Value> = host
            .facts
            .as_map()
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(fact, value)| (fact.clone(), value.clone()))
            .collect();

        serde_json::from_value(Value::Object(facts)).map_err(|e| {
            CompileError::config(format!("invalid directives on host {}: {}", host.id(), e))
        })
    }
}
