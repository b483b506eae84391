// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the fingerprint source

use super::sshfp::*;
use std::fs;

// ========== Line Parser ==========

#[test]
fn test_parse_keygen_line() {
    let (rest, fp) = sshfp_line("web1 IN SSHFP 4 2 8a1dbeef").unwrap();
    assert_eq!(rest, "");
    assert_eq!(
        fp,
        Sshfp {
            algorithm: 4,
            fp_type: 2,
            fingerprint: "8a1dbeef".to_string(),
        }
    );
}

#[test]
fn test_parse_line_with_ttl() {
    let (_, fp) = sshfp_line("web1.example.com. 3600 in sshfp 1 1 abcdef").unwrap();
    assert_eq!(fp.algorithm, 1);
    assert_eq!(fp.fingerprint, "abcdef");
}

#[test]
fn test_parse_bare_line() {
    let (_, fp) = sshfp_line("3 2 00ff").unwrap();
    assert_eq!(fp.to_rdata(), "3 2 00ff");
}

#[test]
fn test_parse_fingerprints_skips_comments_and_garbage() {
    let content = "\
# generated by ssh-keygen
web1 IN SSHFP 1 1 aaaa

web1 IN SSHFP 1 2 bbbb
web1 IN SSHFP 1 2 not-hex
; another comment
4 2 cccc
";
    let fps = parse_fingerprints(content, "test");
    let rdata: Vec<_> = fps.iter().map(Sshfp::to_rdata).collect();
    assert_eq!(rdata, vec!["1 1 aaaa", "1 2 bbbb", "4 2 cccc"]);
}

#[test]
fn test_parse_rejects_out_of_range_algorithm() {
    assert!(parse_fingerprints("999 1 aaaa", "test").is_empty());
}

// ========== Directory Source ==========

#[test]
fn test_fingerprint_dir_reads_host_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("web1"), "web1 IN SSHFP 4 2 abcd\n").unwrap();

    let source = FingerprintDir::new(dir.path());
    let fps = source.fingerprints("web1").unwrap();
    assert_eq!(fps.len(), 1);
    assert_eq!(fps[0].to_rdata(), "4 2 abcd");
}

#[test]
fn test_fingerprint_dir_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let source = FingerprintDir::new(dir.path());
    assert!(source.fingerprints("nohost").unwrap().is_empty());
}

#[test]
fn test_fingerprint_dir_default_path() {
    let source = FingerprintDir::default();
    assert_eq!(
        source.path_for("web1"),
        std::path::PathBuf::from(DEFAULT_SSHFP_DIR).join("web1")
    );
}
