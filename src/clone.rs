// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone clone engine and template cleanup
//!
//! A clone directive derives a zone from one already in the store: the
//! source is copied, excluded records are dropped, every name anchored on
//! the source zone is renamed to the clone, and whatever the operator
//! declared for the clone is merged on top. Template zones only exist to be
//! cloned and are removed before the zone set is emitted.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{
    facts::CloneDirective,
    metrics,
    tree::{anchored_suffix, deep_merge, rewrite},
    types::{CompileError, CompileResult},
    zones::{Zone, ZoneKind, ZoneStore},
};

/// Expand every clone directive, in clone-name order
///
/// A clone may use a zone produced by an earlier clone as its source.
pub fn expand_clones(
    store: &mut ZoneStore,
    clones: &BTreeMap<String, CloneDirective>,
) -> CompileResult<()> {
    for (clone_name, directive) in clones {
        let zone = clone_zone(store, clone_name, directive)?;
        info!(
            "cloned zone {} from {} as {}",
            clone_name,
            directive.source_zone,
            zone.effective_kind().as_str()
        );
        store.insert(clone_name.clone(), zone);
        metrics::record_clone();
    }
    Ok(())
}

/// Build the zone a clone directive describes without storing it
pub fn clone_zone(
    store: &ZoneStore,
    clone_name: &str,
    directive: &CloneDirective,
) -> CompileResult<Zone> {
    let source = store.get(&directive.source_zone).ok_or_else(|| {
        CompileError::config(format!(
            "clone {} refers to unknown zone {}",
            clone_name, directive.source_zone
        ))
    })?;

    let mut copy = source.clone();
    copy.records.retain(|name, _| {
        let excluded = directive
            .exclude_patterns
            .iter()
            .any(|pattern| name.contains(pattern.as_str()));
        if excluded {
            debug!("excluding {} from clone {}", name, clone_name);
        }
        !excluded
    });

    let pattern = anchored_suffix(&directive.source_zone).map_err(|e| {
        CompileError::config(format!(
            "cannot build pattern for zone {}: {}",
            directive.source_zone, e
        ))
    })?;
    let derived = rewrite(&serde_json::to_value(&copy)?, &pattern, clone_name);

    let declared = match store.get(clone_name) {
        Some(zone) => serde_json::to_value(zone)?,
        None => Value::Object(Map::new()),
    };

    let mut merged = deep_merge(&derived, &declared);
    if let (Value::Object(merged), Value::Object(derived), Value::Object(declared)) =
        (&mut merged, &derived, &declared)
    {
        for (key, value) in derived {
            if key != "records" && !declared.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    let mut zone: Zone = serde_json::from_value(merged).map_err(|e| {
        CompileError::config(format!("clone {} is not a valid zone: {}", clone_name, e))
    })?;
    zone.kind = Some(zone.kind.map_or(ZoneKind::Master, |kind| kind.instantiated()));
    zone.dedup_records();
    Ok(zone)
}

/// Remove every zone still tagged as a template
///
/// Returns the number of zones removed.
pub fn remove_templates(store: &mut ZoneStore) -> usize {
    let before = store.len();
    store.retain(|name, zone| {
        if zone.is_template() {
            info!("dropping template zone {}", name);
            false
        } else {
            true
        }
    });
    before - store.len()
}
