// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Structural operations over configuration trees
//!
//! Zone definitions arrive as arbitrary JSON, so the two primitives the clone
//! engine is built on operate on `serde_json::Value` directly:
//!
//! - [`deep_merge`] combines a derived tree with an operator-declared one
//! - [`rewrite`] renames every occurrence of a pattern in keys and strings
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use zonefacts::tree::{anchored_suffix, deep_merge, rewrite};
//!
//! let merged = deep_merge(&json!({"a": [1], "b": 1}), &json!({"a": [2], "b": 2}));
//! assert_eq!(merged, json!({"a": [1, 2], "b": 2}));
//!
//! let pattern = anchored_suffix("example.com").unwrap();
//! let renamed = rewrite(&json!({"www.example.com": "example.com"}), &pattern, "example.net");
//! assert_eq!(renamed, json!({"www.example.net": "example.net"}));
//! ```

use regex::{NoExpand, Regex};
use serde_json::{Map, Value};

/// Merge `overlay` into a copy of `base`
///
/// - nested objects on both sides are merged recursively
/// - arrays on both sides are concatenated, base elements first
/// - anything else in `overlay` replaces the value in `base`
///
/// A null or empty overlay yields a copy of `base`. Neither input is
/// modified.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let mut result = base.clone();
    if !overlay.is_null() {
        merge_into(&mut result, overlay);
    }
    result
}

fn merge_into(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(base_list), Value::Array(overlay_list)) => {
            base_list.extend(overlay_list.iter().cloned());
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Replace every match of `pattern` in all object keys and string leaves
///
/// Numbers, booleans and nulls pass through unchanged. `replacement` is used
/// literally; `$` in it is not a capture group reference. When two keys of
/// one object rewrite to the same name the later one wins.
pub fn rewrite(value: &Value, pattern: &Regex, replacement: &str) -> Value {
    match value {
        Value::String(s) => Value::String(
            pattern
                .replace_all(s, NoExpand(replacement))
                .into_owned(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rewrite(item, pattern, replacement))
                .collect(),
        ),
        Value::Object(map) => {
            let mut rewritten = Map::with_capacity(map.len());
            for (key, item) in map {
                let key = pattern.replace_all(key, NoExpand(replacement)).into_owned();
                rewritten.insert(key, rewrite(item, pattern, replacement));
            }
            Value::Object(rewritten)
        }
        other => other.clone(),
    }
}

/// Build a pattern matching `name` literally, anchored at end of string
pub fn anchored_suffix(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}$", regex::escape(name)))
}
