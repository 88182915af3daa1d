//! Caller-facing outcome types.
//!
//! `AppendOutcome` is the append path's substitute for `Result`: a failed
//! audit write is reported as data, never thrown, so the business operation
//! that triggered the write decides for itself whether to care.
//! `VerificationResult` is the verifier's report.

use serde::{Deserialize, Serialize};

/// What happened to a single append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendOutcome {
    /// True when the record was durably written and the chain advanced.
    pub written: bool,
    /// The record's chain hash, present only when written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Failure description, present only when not written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppendOutcome {
    pub fn ok(hash: impl Into<String>) -> Self {
        Self {
            written: true,
            hash: Some(hash.into()),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            written: false,
            hash: None,
            error: Some(reason.into()),
        }
    }
}

/// The verifier's verdict on one channel.
///
/// A broken chain reports the first divergence only — a broken link
/// invalidates confidence in everything after it, so there is nothing
/// meaningful to say about later records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    /// 1-based position of the first record that fails recomputation,
    /// or `None` when the chain is intact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken_at: Option<usize>,
    /// Records examined: the full count on success, the break position
    /// on failure.
    pub entries_checked: usize,
}

impl VerificationResult {
    pub fn valid(entries_checked: usize) -> Self {
        Self {
            valid: true,
            broken_at: None,
            entries_checked,
        }
    }

    pub fn broken(position: usize) -> Self {
        Self {
            valid: false,
            broken_at: Some(position),
            entries_checked: position,
        }
    }
}
