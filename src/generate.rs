// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Numeric range record generation
//!
//! Modelled on BIND's `$GENERATE`: a range `<start>-<end>[/<step>]` and a
//! record template whose names and contents contain `$`. Every iteration
//! substitutes the counter for `$` and stores the result, replacing whatever
//! was at that name before.
//!
//! # Examples
//!
//! ```rust
//! use zonefacts::generate::{parse_range, GenerateRange};
//!
//! let range = parse_range("1-3").unwrap();
//! assert_eq!(range, GenerateRange { start: 1, end: 3, step: 1 });
//! assert_eq!(range.values().collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```

use nom::{
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map_res, opt},
    sequence::{delimited, preceded, separated_pair, tuple},
    IResult,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{
    facts::RecordTemplate,
    records::{tally, PASS_GENERATE},
    types::{CompileError, CompileResult},
    zones::{is_within, join_labels, Outcome, RData, TypeMap, ZoneStore},
};

/// Counter placeholder in names and contents
pub const PLACEHOLDER: &str = "$";

/// Most names one range may generate
pub const MAX_GENERATE_COUNT: u64 = 65_536;

/// Inclusive counter range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateRange {
    pub start: u64,
    pub end: u64,
    pub step: u64,
}

impl GenerateRange {
    /// Number of counter values
    pub fn count(&self) -> u64 {
        if self.start > self.end {
            return 0;
        }
        (self.end - self.start) / self.step.max(1) + 1
    }

    pub fn values(&self) -> impl Iterator<Item = u64> {
        // a zero step counts as one
        (self.start..=self.end).step_by(self.step.max(1) as usize)
    }
}

fn bound(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(input)
}

fn range_spec(input: &str) -> IResult<&str, (u64, u64, Option<u64>)> {
    let (input, (_, (start, end), step, _)) = tuple((
        space0,
        separated_pair(bound, delimited(space0, char('-'), space0), bound),
        opt(preceded(delimited(space0, char('/'), space0), bound)),
        space0,
    ))(input)?;
    Ok((input, (start, end, step)))
}

/// Parse `<start>-<end>` with an optional `/<step>`
pub fn parse_range(input: &str) -> CompileResult<GenerateRange> {
    let (_, (start, end, step)) = all_consuming(range_spec)(input)
        .map_err(|e| CompileError::config(format!("invalid generate range {:?}: {}", input, e)))?;

    if start > end {
        return Err(CompileError::config(format!(
            "generate range {:?} starts after it ends",
            input
        )));
    }
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(CompileError::config(format!(
            "generate range {:?} has a zero step",
            input
        )));
    }

    let range = GenerateRange { start, end, step };
    if range.count() > MAX_GENERATE_COUNT {
        return Err(CompileError::config(format!(
            "generate range {:?} yields {} names, more than {}",
            input,
            range.count(),
            MAX_GENERATE_COUNT
        )));
    }

    Ok(range)
}

/// Record name for one iteration; names outside the zone are placed under it
pub fn generated_name(template: &str, zone: &str, counter: u64) -> String {
    let name = template
        .replace(PLACEHOLDER, &counter.to_string())
        .trim_end_matches('.')
        .to_string();
    if is_within(&name, zone) {
        name
    } else {
        join_labels(&[name.as_str(), zone])
    }
}

fn instantiate(types: &TypeMap, counter: &str) -> TypeMap {
    types
        .iter()
        .map(|(rtype, values)| {
            let values = values
                .iter()
                .map(|rdata| RData {
                    content: rdata.content.replace(PLACEHOLDER, counter),
                    extra: rdata.extra.clone(),
                })
                .collect();
            (rtype.clone(), values)
        })
        .collect()
}

/// Expand every generate directive
///
/// `directives` maps zone → range → name template → records. Zones this host
/// does not hold are skipped.
pub fn expand_generate(
    directives: &BTreeMap<String, BTreeMap<String, BTreeMap<String, RecordTemplate>>>,
    store: &mut ZoneStore,
) -> CompileResult<()> {
    for (zone_name, ranges) in directives {
        let zone_name = zone_name.trim_end_matches('.');
        let Some(zone) = store.get_mut(zone_name) else {
            warn!("generate directive for unknown zone {}, skipping", zone_name);
            continue;
        };

        let mut generated = 0;
        for (spec, templates) in ranges {
            let range = parse_range(spec)?;
            for (name_template, template) in templates {
                let types = template.to_type_map();
                for counter in range.values() {
                    let name = generated_name(name_template, zone_name, counter);
                    let records = instantiate(&types, &counter.to_string());
                    for (rtype, values) in &records {
                        for rdata in values {
                            tally(PASS_GENERATE, &name, rtype, &rdata.content, Outcome::Inserted);
                        }
                    }
                    zone.records.insert(name, records);
                    generated += 1;
                }
            }
        }
        info!("generated {} names in zone {}", generated, zone_name);
    }
    Ok(())
}
