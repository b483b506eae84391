// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! zonefacts command line
//!
//! Compiles the zone set of one host from an inventory dump:
//! - Reads the inventory JSON from a file or standard input
//! - Reads SSH fingerprint files from a directory
//! - Writes the `pdns_auth_api_zones` document to standard output or a file
//!
//! Logs go to standard error so the document can be piped.
//!
//! ```bash
//! ansible-inventory --list --export | jq ._meta.hostvars > hostvars.json
//! zonefacts ns1 hostvars.json --pretty
//! ```

use anyhow::Context;
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use zonefacts::{
    facts::Inventory,
    metrics,
    pipeline::Compiler,
    sshfp::{FingerprintDir, DEFAULT_SSHFP_DIR},
};

/// Inventory path meaning standard input
const STDIN_PATH: &str = "-";

#[derive(Parser)]
#[command(name = "zonefacts")]
#[command(about = "Compile inventory facts into PowerDNS zone definitions", long_about = None)]
#[command(version)]
struct Cli {
    /// Inventory id of the host to compile zones for
    host: String,

    /// Inventory JSON (host id → facts); `-` reads standard input
    inventory: String,

    /// Directory holding one SSH fingerprint file per host
    #[arg(long, env = "ZONEFACTS_SSHFP_DIR", default_value = DEFAULT_SSHFP_DIR)]
    sshfp_dir: PathBuf,

    /// Write the zone set here instead of standard output
    #[arg(short, long, env = "ZONEFACTS_OUTPUT")]
    output: Option<PathBuf>,

    /// Pretty-print the zone set
    #[arg(long)]
    pretty: bool,

    /// Write Prometheus metrics here after the run
    #[arg(long, env = "ZONEFACTS_METRICS_FILE")]
    metrics_file: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_inventory(path: &str) -> anyhow::Result<Inventory> {
    let content = if path == STDIN_PATH {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read inventory from stdin")?;
        content
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inventory {}", path))?
    };

    let inventory = Inventory::from_json_str(&content)
        .with_context(|| format!("failed to parse inventory {}", path))?;
    debug!("loaded {} hosts from {}", inventory.len(), path);
    Ok(inventory)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    info!("zonefacts v{}", env!("CARGO_PKG_VERSION"));
    metrics::init_metrics();

    let inventory = read_inventory(&cli.inventory)?;
    let fingerprints = FingerprintDir::new(&cli.sshfp_dir);
    debug!("fingerprint directory: {}", cli.sshfp_dir.display());

    let zones = Compiler::new(&inventory, &cli.host, &fingerprints)
        .compile()
        .with_context(|| format!("failed to compile zones for {}", cli.host))?;

    let mut document = if cli.pretty {
        serde_json::to_string_pretty(&zones)?
    } else {
        serde_json::to_string(&zones)?
    };
    document.push('\n');

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {} zones to {}", zones.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .context("failed to write zone set")?;
            stdout.flush()?;
        }
    }

    if let Some(path) = &cli.metrics_file {
        let text = metrics::gather_metrics()
            .map_err(|e| anyhow::anyhow!("failed to gather metrics: {}", e))?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }

    Ok(())
}
