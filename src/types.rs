// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common types and errors used throughout the zonefacts library

/// Result type returned by every compiler stage
pub type CompileResult<T> = Result<T, CompileError>;

/// Compiler error type
///
/// Every variant is fatal: the compiler never emits a partial document.
/// Lookups that find nothing (no owning zone, no fingerprint file, a peer
/// without zone data) are not errors and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid fact {fact} on host {host}: {reason}")]
    Fact {
        host: String,
        fact: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CompileError::Config(message.into())
    }

    /// Shorthand for a malformed or missing host fact
    pub fn fact(host: &str, fact: &str, reason: impl Into<String>) -> Self {
        CompileError::Fact {
            host: host.to_string(),
            fact: fact.to_string(),
            reason: reason.into(),
        }
    }
}
