// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone data model and in-memory zone store
//!
//! This module defines the shape of a compiled zone set and the store every
//! compiler stage reads and mutates:
//! - Zone, record and rdata types (serialized like `pdns_auth_api_zones`)
//! - Longest-suffix resolution of record names to owning zones
//! - Record insertion with explicit policies

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Record type constants
pub const RECORD_TYPE_A: &str = "A";
pub const RECORD_TYPE_AAAA: &str = "AAAA";
pub const RECORD_TYPE_CNAME: &str = "CNAME";
pub const RECORD_TYPE_MX: &str = "MX";
pub const RECORD_TYPE_NS: &str = "NS";
pub const RECORD_TYPE_PTR: &str = "PTR";
pub const RECORD_TYPE_SSHFP: &str = "SSHFP";
pub const RECORD_TYPE_TXT: &str = "TXT";

/// Zone kind as understood by the PowerDNS API
///
/// The `-Template` kinds only exist during compilation; a compiled zone set
/// never contains one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Master,
    Native,
    Slave,
    #[serde(rename = "Master-Template")]
    MasterTemplate,
    #[serde(rename = "Slave-Template")]
    SlaveTemplate,
    #[serde(rename = "Native-Template")]
    NativeTemplate,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Master => "Master",
            ZoneKind::Native => "Native",
            ZoneKind::Slave => "Slave",
            ZoneKind::MasterTemplate => "Master-Template",
            ZoneKind::SlaveTemplate => "Slave-Template",
            ZoneKind::NativeTemplate => "Native-Template",
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(
            self,
            ZoneKind::MasterTemplate | ZoneKind::SlaveTemplate | ZoneKind::NativeTemplate
        )
    }

    /// Whether this host holds the zone data itself (Master or Native)
    pub fn is_authoritative(&self) -> bool {
        matches!(self, ZoneKind::Master | ZoneKind::Native)
    }

    /// Kind a zone takes once it is instantiated from a template
    pub fn instantiated(&self) -> ZoneKind {
        match self {
            ZoneKind::MasterTemplate => ZoneKind::Master,
            ZoneKind::SlaveTemplate => ZoneKind::Slave,
            ZoneKind::NativeTemplate => ZoneKind::Native,
            live => *live,
        }
    }
}

/// Single resource record value
///
/// Serialized as `{"c": "<content>"}`; any other attribute (e.g. `disabled`)
/// is preserved as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RData {
    /// Record content (address, target name, quoted text, ...)
    #[serde(rename = "c", alias = "content")]
    pub content: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extra: Map::new(),
        }
    }
}

/// Record type tag → ordered values
pub type TypeMap = BTreeMap<String, Vec<RData>>;

/// Fully-qualified record name → record types
pub type RecordMap = BTreeMap<String, TypeMap>;

/// Zone definition
///
/// `records` is always written for zones holding their own data, even when
/// empty; secondary zones only carry it when they have records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub kind: Option<ZoneKind>,

    #[serde(default)]
    pub records: RecordMap,

    /// Primary servers, only meaningful for Slave zones
    #[serde(default)]
    pub masters: Option<Vec<String>>,

    /// Every other zone attribute, carried through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    pub fn new(kind: ZoneKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Secondary zone replicated from `masters`
    pub fn slave(masters: Vec<String>) -> Self {
        Self {
            kind: Some(ZoneKind::Slave),
            masters: Some(masters),
            ..Default::default()
        }
    }

    /// Kind used for decisions; PowerDNS treats a zone without kind as Native
    pub fn effective_kind(&self) -> ZoneKind {
        self.kind.unwrap_or(ZoneKind::Native)
    }

    pub fn is_template(&self) -> bool {
        self.kind.is_some_and(|kind| kind.is_template())
    }

    pub fn is_authoritative(&self) -> bool {
        self.effective_kind().is_authoritative()
    }

    /// Replicated from masters rather than holding its own data
    pub fn is_secondary(&self) -> bool {
        matches!(self.kind, Some(ZoneKind::Slave | ZoneKind::SlaveTemplate))
    }

    /// Drop values repeating an earlier value's content for the same name and
    /// type, and repeated masters
    pub fn dedup_records(&mut self) {
        for values in self.records.values_mut().flat_map(|types| types.values_mut()) {
            let mut seen = Vec::with_capacity(values.len());
            values.retain(|rdata| {
                if seen.contains(&rdata.content) {
                    false
                } else {
                    seen.push(rdata.content.clone());
                    true
                }
            });
        }

        if let Some(masters) = self.masters.as_mut() {
            let mut seen = Vec::with_capacity(masters.len());
            masters.retain(|master| {
                if seen.contains(master) {
                    false
                } else {
                    seen.push(master.clone());
                    true
                }
            });
        }
    }

    /// Insert one value under `name`/`rtype` following `policy`
    pub fn insert_record(
        &mut self,
        name: &str,
        rtype: &str,
        content: &str,
        policy: Policy,
    ) -> Outcome {
        match policy {
            Policy::SkipIfNameExists if self.records.contains_key(name) => {
                return Outcome::Skipped;
            }
            Policy::SkipIfTypeExists
                if self
                    .records
                    .get(name)
                    .is_some_and(|types| types.contains_key(rtype)) =>
            {
                return Outcome::Skipped;
            }
            _ => {}
        }

        let values = self
            .records
            .entry(name.to_string())
            .or_default()
            .entry(rtype.to_string())
            .or_default();

        if policy == Policy::Replace {
            *values = vec![RData::new(content)];
            return Outcome::Inserted;
        }

        if values.iter().any(|rdata| rdata.content == content) {
            Outcome::Skipped
        } else {
            values.push(RData::new(content));
            Outcome::Inserted
        }
    }
}

impl Serialize for Zone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(kind) = &self.kind {
            map.serialize_entry("kind", kind)?;
        }
        if !self.records.is_empty() || !self.is_secondary() {
            map.serialize_entry("records", &self.records)?;
        }
        if let Some(masters) = &self.masters {
            map.serialize_entry("masters", masters)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Zone name → zone definition
pub type ZoneSet = BTreeMap<String, Zone>;

/// How a synthesized value combines with what is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Append unless an identical value exists for the same name and type
    AppendIfAbsent,
    /// Leave the name alone if it already has any value of this type
    SkipIfTypeExists,
    /// Leave the name alone if it already has any record at all
    SkipIfNameExists,
    /// Replace all values of this type (last writer wins)
    Replace,
}

/// Result of a single insertion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Skipped,
    /// No zone in the store owns the name
    NoZone,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Inserted => "inserted",
            Outcome::Skipped => "skipped",
            Outcome::NoZone => "no_zone",
        }
    }
}

/// Whether `name` is `zone` itself or lies below it on a label boundary
pub fn is_within(name: &str, zone: &str) -> bool {
    name == zone
        || name
            .strip_suffix(zone)
            .is_some_and(|rest| rest.ends_with('.'))
}

/// Join name parts with dots, dropping empty parts and stray dots
pub fn join_labels(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches('.'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Absolute form of a name (trailing dot)
pub fn absolute(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// In-memory zone set shared by all compiler stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneStore {
    zones: ZoneSet,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones(zones: ZoneSet) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn into_zones(self) -> ZoneSet {
        self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn contains(&self, zone: &str) -> bool {
        self.zones.contains_key(zone)
    }

    pub fn get(&self, zone: &str) -> Option<&Zone> {
        self.zones.get(zone)
    }

    pub fn get_mut(&mut self, zone: &str) -> Option<&mut Zone> {
        self.zones.get_mut(zone)
    }

    pub fn insert(&mut self, name: impl Into<String>, zone: Zone) -> Option<Zone> {
        self.zones.insert(name.into(), zone)
    }

    pub fn remove(&mut self, zone: &str) -> Option<Zone> {
        self.zones.remove(zone)
    }

    /// Drop every zone for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Zone) -> bool) {
        self.zones.retain(|name, zone| keep(name.as_str(), zone));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Zone)> {
        self.zones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Zone)> {
        self.zones.iter_mut()
    }

    /// Find the zone owning `fqdn` by longest matching suffix
    ///
    /// A trailing dot on `fqdn` is ignored. Returns `None` when no zone
    /// qualifies.
    pub fn resolve(&self, fqdn: &str) -> Option<&str> {
        let fqdn = fqdn.trim_end_matches('.');
        self.zones
            .keys()
            .filter(|zone| is_within(fqdn, zone))
            .max_by_key(|zone| zone.len())
            .map(String::as_str)
    }

    /// Insert a value into whichever zone owns `name`
    pub fn add_record(&mut self, name: &str, rtype: &str, content: &str, policy: Policy) -> Outcome {
        let name = name.trim_end_matches('.');
        let Some(zone_name) = self.resolve(name).map(str::to_string) else {
            return Outcome::NoZone;
        };
        self.add_to_zone(&zone_name, name, rtype, content, policy)
    }

    /// Insert a value into a specific zone
    pub fn add_to_zone(
        &mut self,
        zone: &str,
        name: &str,
        rtype: &str,
        content: &str,
        policy: Policy,
    ) -> Outcome {
        match self.zones.get_mut(zone) {
            Some(zone) => zone.insert_record(name, rtype, content, policy),
            None => Outcome::NoZone,
        }
    }

    /// Whether the zone owning `name` holds any record at `name`
    pub fn contains_name(&self, name: &str) -> bool {
        self.resolve(name)
            .and_then(|zone| self.zones.get(zone))
            .is_some_and(|zone| zone.records.contains_key(name.trim_end_matches('.')))
    }

    /// Whether any zone holds a record of `rtype` at `name`
    pub fn has_type(&self, name: &str, rtype: &str) -> bool {
        self.resolve(name)
            .and_then(|zone| self.zones.get(zone))
            .and_then(|zone| zone.records.get(name.trim_end_matches('.')))
            .is_some_and(|types| types.contains_key(rtype))
    }
}
