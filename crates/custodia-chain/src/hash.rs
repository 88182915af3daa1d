//! Chain hashing over canonically serialized records.
//!
//! Hash input layout (bytes, in order):
//!   1. canonical JSON of the record, without its hash (compact
//!      serde_json, struct fields in declaration order, detail keys
//!      sorted, timestamps in the pinned UTC microsecond format)
//!   2. the previous record's hash as UTF-8 bytes (64 ASCII hex chars),
//!      or nothing for the first record in a channel
//!
//! Canonical serialization is the linchpin: if the same logical record
//! could serialize two ways, verification would report false tampering.
//! Every deterministic-format decision lives in custodia-contracts; this
//! module just relies on them.

use sha2::{Digest, Sha256};

use custodia_contracts::{CustodiaError, CustodiaResult, LogRecord};

use crate::sealed::SealedRecord;

/// The chain seed: the "previous hash" of a channel's first record.
///
/// The empty string — hashing the first record appends no previous-hash
/// bytes at all, which keeps genesis unambiguous without a sentinel value.
pub const SEED_HASH: &str = "";

/// Canonical bytes for a record: compact JSON, stable across processes,
/// locales, and repeated calls.
pub fn canonical_bytes(record: &LogRecord) -> CustodiaResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| CustodiaError::Serialization {
        reason: format!("failed to canonicalize record: {}", e),
    })
}

/// Compute the SHA-256 chain hash for `record` given the previous
/// record's hash. Returns a lowercase 64-character hex string.
pub fn hash_record(record: &LogRecord, prev_hash: &str) -> CustodiaResult<String> {
    let bytes = canonical_bytes(record)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hasher.update(prev_hash.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

/// Seal a record into the chain: compute its hash against `prev_hash` and
/// wrap it for persistence.
pub fn seal(record: LogRecord, prev_hash: &str) -> CustodiaResult<SealedRecord> {
    let hash = hash_record(&record, prev_hash)?;
    Ok(SealedRecord { record, hash })
}
