//! Pure chain verification over sealed records.

use custodia_contracts::VerificationResult;

use crate::hash::{hash_record, SEED_HASH};
use crate::sealed::SealedRecord;

/// Verify a channel's records in append order.
///
/// For each record, its stored hash is compared against the value
/// recomputed from the record's own fields and the running previous hash.
/// The first mismatch stops verification — a broken link invalidates
/// confidence in everything after it — and is reported at its 1-based
/// position. An empty stream is valid.
///
/// Two interleaved writers that chained against the same stale previous
/// hash surface here exactly like tampering: the second of the two records
/// fails recomputation. The verifier cannot distinguish cause, by design.
pub fn verify_records(records: &[SealedRecord]) -> VerificationResult {
    let mut prev = SEED_HASH.to_string();

    for (idx, sealed) in records.iter().enumerate() {
        let position = idx + 1;

        let recomputed = match hash_record(&sealed.record, &prev) {
            Ok(hash) => hash,
            // A record that cannot be recomputed is indistinguishable from
            // a tampered one.
            Err(_) => return VerificationResult::broken(position),
        };

        if recomputed != sealed.hash {
            return VerificationResult::broken(position);
        }

        prev = sealed.hash.clone();
    }

    VerificationResult::valid(records.len())
}
