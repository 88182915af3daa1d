//! The persisted record type.
//!
//! `SealedRecord` is a `LogRecord` plus the chain hash computed for it.
//! One sealed record serializes to one JSON object — the record's fields
//! flattened, `hash` last — which is exactly the JSON-Lines form written
//! to a channel file.

use serde::{Deserialize, Serialize};

use custodia_contracts::{CustodiaError, CustodiaResult, LogRecord};

/// A record with its computed chain hash.
///
/// Construct via [`crate::hash::seal`], never by hand — the hash commits
/// to every record field plus the previous record's hash, and a sealed
/// record with a fabricated hash is precisely what verification exists to
/// catch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedRecord {
    #[serde(flatten)]
    pub record: LogRecord,
    /// Lowercase hex SHA-256. Serialized after the record fields.
    pub hash: String,
}

impl SealedRecord {
    /// Serialize to a single JSON line (no trailing newline).
    ///
    /// JSON string escaping guarantees no embedded raw newlines.
    pub fn to_line(&self) -> CustodiaResult<String> {
        serde_json::to_string(self).map_err(|e| CustodiaError::Serialization {
            reason: format!("failed to serialize sealed record: {}", e),
        })
    }

    /// Parse one JSON line back into a sealed record.
    pub fn from_line(line: &str) -> CustodiaResult<Self> {
        serde_json::from_str(line).map_err(|e| CustodiaError::Serialization {
            reason: format!("failed to parse sealed record: {}", e),
        })
    }
}
