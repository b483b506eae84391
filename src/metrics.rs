// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for zonefacts
//!
//! A compile run is short-lived, so metrics are gathered once at the end and
//! written in text exposition format (suitable for the node exporter textfile
//! collector):
//! - Record synthesis outcomes per pass
//! - Clone and secondary-inference counts
//! - Emitted zones by kind
//! - Compile duration

use lazy_static::lazy_static;
use prometheus::{
    opts, register_counter, register_counter_vec, register_gauge_vec, register_histogram,
    Counter, CounterVec, Encoder, GaugeVec, Histogram, TextEncoder,
};

use crate::zones::{Outcome, ZoneSet};

lazy_static! {
    /// Synthesized records by pass and outcome
    pub static ref RECORDS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "zonefacts_records_total",
            "Total number of synthesized records by pass and outcome"
        ),
        &["pass", "outcome"]
    )
    .expect("Failed to create RECORDS_TOTAL metric");

    /// Zones produced by clone directives
    pub static ref ZONES_CLONED_TOTAL: Counter = register_counter!(
        opts!(
            "zonefacts_zones_cloned_total",
            "Total number of zones produced from clone directives"
        )
    )
    .expect("Failed to create ZONES_CLONED_TOTAL metric");

    /// Secondary zones inferred from primaries
    pub static ref SECONDARIES_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "zonefacts_secondaries_total",
            "Total number of secondary zones inferred, by source"
        ),
        &["source"]
    )
    .expect("Failed to create SECONDARIES_TOTAL metric");

    /// Zones in the emitted document by kind
    pub static ref ZONES_EMITTED: GaugeVec = register_gauge_vec!(
        opts!(
            "zonefacts_zones_emitted",
            "Number of zones in the emitted document"
        ),
        &["kind"]
    )
    .expect("Failed to create ZONES_EMITTED metric");

    /// Compile duration histogram
    pub static ref COMPILE_DURATION_SECONDS: Histogram = register_histogram!(
        "zonefacts_compile_duration_seconds",
        "Zone compile duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to create COMPILE_DURATION_SECONDS metric");

    /// Application info metric
    pub static ref APP_INFO: CounterVec = register_counter_vec!(
        opts!(
            "zonefacts_app_info",
            "Application information"
        ),
        &["version"]
    )
    .expect("Failed to create APP_INFO metric");
}

/// Initialize metrics with application info
pub fn init_metrics() {
    APP_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .inc();
}

/// Generate metrics output in Prometheus format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the outcome of one record insertion attempt
pub fn record_synthesis(pass: &str, outcome: Outcome) {
    RECORDS_TOTAL
        .with_label_values(&[pass, outcome.as_str()])
        .inc();
}

/// Record a zone produced by a clone directive
pub fn record_clone() {
    ZONES_CLONED_TOTAL.inc();
}

/// Record an inferred secondary zone
pub fn record_secondary(source: &str) {
    SECONDARIES_TOTAL.with_label_values(&[source]).inc();
}

/// Record a finished compile run
pub fn record_compile(zones: &ZoneSet, duration: f64) {
    COMPILE_DURATION_SECONDS.observe(duration);
    ZONES_EMITTED.reset();
    for zone in zones.values() {
        ZONES_EMITTED
            .with_label_values(&[zone.effective_kind().as_str()])
            .inc();
    }
}
