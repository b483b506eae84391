// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SSH host-key fingerprint source
//!
//! Fingerprints are read from one file per host, in the format printed by
//! `ssh-keygen -r <host>`:
//!
//! ```text
//! web1 IN SSHFP 1 2 0f3c...
//! web1 IN SSHFP 4 2 8a1d...
//! ```
//!
//! Bare `<algorithm> <type> <fingerprint>` lines are accepted as well. A
//! missing file contributes nothing.
//!
//! # Examples
//!
//! ```rust
//! use zonefacts::sshfp::parse_fingerprints;
//!
//! let fps = parse_fingerprints("web1 IN SSHFP 4 2 8a1d\n# comment\n1 1 beef\n", "web1");
//! assert_eq!(fps.len(), 2);
//! assert_eq!(fps[0].to_rdata(), "4 2 8a1d");
//! ```

use nom::{
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res, opt, value},
    sequence::{terminated, tuple},
    IResult,
};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::CompileResult;

/// Default directory holding one fingerprint file per host
pub const DEFAULT_SSHFP_DIR: &str = "/etc/zonefacts/sshfp";

/// One SSHFP record value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sshfp {
    pub algorithm: u8,
    pub fp_type: u8,
    pub fingerprint: String,
}

impl Sshfp {
    /// Record content: `<algorithm> <type> <fingerprint>`
    pub fn to_rdata(&self) -> String {
        format!("{} {} {}", self.algorithm, self.fp_type, self.fingerprint)
    }
}

/// Where the internal-naming pass gets host fingerprints from
pub trait FingerprintSource {
    /// Fingerprints for `host`; an empty list when none are known
    fn fingerprints(&self, host: &str) -> CompileResult<Vec<Sshfp>>;
}

/// Fingerprint files stored as `<dir>/<host>`
#[derive(Debug, Clone)]
pub struct FingerprintDir {
    dir: PathBuf,
}

impl FingerprintDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, host: &str) -> PathBuf {
        self.dir.join(host)
    }
}

impl Default for FingerprintDir {
    fn default() -> Self {
        Self::new(DEFAULT_SSHFP_DIR)
    }
}

impl FingerprintSource for FingerprintDir {
    fn fingerprints(&self, host: &str) -> CompileResult<Vec<Sshfp>> {
        let path = self.path_for(host);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(parse_fingerprints(&content, &path.display().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no fingerprint file for {} at {}", host, path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ========== Line Parsers ==========

fn number(input: &str) -> IResult<&str, u8> {
    map_res(digit1, str::parse::<u8>)(input)
}

fn hex(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_hexdigit())(input)
}

/// `<owner> [ttl] IN SSHFP ` as printed by ssh-keygen
fn owner_prefix(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            take_while1(|c: char| !c.is_whitespace()),
            space1,
            opt(terminated(digit1, space1)),
            tag_no_case("IN"),
            space1,
            tag_no_case("SSHFP"),
            space1,
        )),
    )(input)
}

/// Parse one fingerprint line
pub(crate) fn sshfp_line(input: &str) -> IResult<&str, Sshfp> {
    let (input, _) = space0(input)?;
    let (input, _) = opt(owner_prefix)(input)?;
    let (input, algorithm) = number(input)?;
    let (input, _) = space1(input)?;
    let (input, fp_type) = number(input)?;
    let (input, _) = space1(input)?;
    let (input, fingerprint) = hex(input)?;
    let (input, _) = space0(input)?;

    Ok((
        input,
        Sshfp {
            algorithm,
            fp_type,
            fingerprint: fingerprint.to_string(),
        },
    ))
}

/// Parse the content of a fingerprint file
///
/// Blank lines and `#`/`;` comments are ignored. Malformed lines are logged
/// and skipped; `origin` names the file in the log.
pub fn parse_fingerprints(content: &str, origin: &str) -> Vec<Sshfp> {
    let mut fingerprints = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        match all_consuming(sshfp_line)(line) {
            Ok((_, fingerprint)) => fingerprints.push(fingerprint),
            Err(_) => warn!(
                "skipping malformed fingerprint line {} in {}: {}",
                index + 1,
                origin,
                line
            ),
        }
    }

    fingerprints
}
