// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! zonefacts - compile inventory facts into PowerDNS zone definitions
//!
//! Takes the facts of every host in a fleet (an Ansible `hostvars` dump) and
//! produces the zone set one host serves, in the shape of the
//! `pdns_auth_api_zones` variable of the PowerDNS authoritative API role.
//!
//! # Features
//!
//! - Zone clones with record exclusion and renaming, template zones
//! - Address and CNAME records declared by any host
//! - Mail exchangers, SPF and null MX records
//! - Reverse-proxy, internal, generated, prefixed and attribute-named records
//! - SSHFP records from `ssh-keygen -r` output
//! - Reverse pointers for every interface address
//! - Secondary zones inferred from the primaries' own zone sets
//! - Prometheus metrics for each run
//!
//! # Usage
//!
//! ## As a Library
//!
//! ```rust
//! use serde_json::json;
//! use zonefacts::{Compiler, FingerprintDir, Inventory};
//!
//! let inventory = Inventory::from_value(json!({
//!     "ns1": {
//!         "ansible_host": "10.0.0.1",
//!         "pdns_auth_api_zones": {"example.com": {"kind": "Native"}},
//!         "dns_facts_generate": {
//!             "example.com": {"1-3": {"$.example.com": [{"A": [{"c": "10.0.0.$"}]}]}}
//!         }
//!     }
//! })).unwrap();
//!
//! let fingerprints = FingerprintDir::default();
//! let zones = Compiler::new(&inventory, "ns1", &fingerprints).compile().unwrap();
//!
//! let records = &zones["example.com"].records;
//! assert_eq!(records["2.example.com"]["A"][0].content, "10.0.0.2");
//!
//! // Serialize for the PowerDNS role
//! let json = serde_json::to_string(&zones).unwrap();
//! ```
//!
//! ## As a Binary
//!
//! ```bash
//! cargo install zonefacts
//! zonefacts ns1 hostvars.json --pretty
//! ```

// Re-export public modules
pub mod clone;
pub mod facts;
pub mod generate;
pub mod internal;
pub mod metrics;
pub mod pipeline;
pub mod proxy;
pub mod records;
pub mod reverse;
pub mod secondary;
pub mod sshfp;
pub mod tree;
pub mod types;
pub mod zones;

// Re-export commonly used types

// Compiler
pub use pipeline::Compiler;

// Error types
pub use types::{CompileError, CompileResult};

// Input types
pub use facts::{Directives, Host, Inventory, NameSpec};

// Zone types
pub use zones::{Outcome, Policy, RData, Zone, ZoneKind, ZoneSet, ZoneStore};

// Fingerprint sources
pub use sshfp::{FingerprintDir, FingerprintSource, Sshfp};

#[cfg(test)]
mod generate_test;
#[cfg(test)]
mod internal_test;
#[cfg(test)]
mod reverse_test;
#[cfg(test)]
mod sshfp_test;
