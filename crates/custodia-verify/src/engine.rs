//! The channel verifier.
//!
//! `ChainVerifier` replays a channel's persisted lines in append order,
//! recomputing every record's hash against the running previous hash.
//! The first divergence — a hash mismatch or a line that does not parse —
//! stops verification and is reported at its 1-based position. Corruption
//! and tampering are indistinguishable here, deliberately: both void the
//! trail from that point on, and the distinction is an operator judgment.

use std::sync::Arc;

use tracing::{debug, warn};

use custodia_chain::{hash_record, SealedRecord, SEED_HASH};
use custodia_contracts::{CustodiaError, CustodiaResult, VerificationResult};
use custodia_core::{ChainStateStore, RecordSource};

/// Verify raw persisted lines as one chain.
///
/// Blank lines are skipped; positions count records, not file lines.
pub fn verify_lines(lines: &[String]) -> VerificationResult {
    let mut prev = SEED_HASH.to_string();
    let mut checked = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let position = checked + 1;

        let sealed = match SealedRecord::from_line(line) {
            Ok(sealed) => sealed,
            // Non-deserializable records are mismatches, not a separate
            // error class.
            Err(_) => return VerificationResult::broken(position),
        };

        match hash_record(&sealed.record, &prev) {
            Ok(recomputed) if recomputed == sealed.hash => {}
            _ => return VerificationResult::broken(position),
        }

        prev = sealed.hash;
        checked = position;
    }

    VerificationResult::valid(checked)
}

/// Replays channels from a `RecordSource` and reports chain integrity.
///
/// Optionally cross-checks the channel's chain-state anchor against the
/// verified log tail: a mismatch there is not tampering (the chain itself
/// proved out) but it does mean the sidecar is stale, so it is logged for
/// the operator.
pub struct ChainVerifier {
    source: Arc<dyn RecordSource>,
    state: Option<Arc<dyn ChainStateStore>>,
}

impl ChainVerifier {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            state: None,
        }
    }

    /// Enable the chain-state anchor cross-check.
    pub fn with_chain_state(mut self, state: Arc<dyn ChainStateStore>) -> Self {
        self.state = Some(state);
        self
    }

    /// Verify one channel.
    pub fn verify(&self, channel: &str) -> CustodiaResult<VerificationResult> {
        let lines = self.source.read_lines(channel)?;
        let result = verify_lines(&lines);

        debug!(
            channel = %channel,
            valid = result.valid,
            entries_checked = result.entries_checked,
            "channel verification complete"
        );

        if result.valid {
            self.check_anchor(channel, &lines)?;
        }

        Ok(result)
    }

    /// Verify every channel the source knows about.
    pub fn verify_all(&self) -> CustodiaResult<Vec<(String, VerificationResult)>> {
        let mut results = Vec::new();
        for channel in self.source.channels()? {
            let result = self.verify(&channel)?;
            results.push((channel, result));
        }
        Ok(results)
    }

    /// Verify one channel, erroring on a break.
    ///
    /// Returns the number of entries checked on success, or
    /// `ChainBroken` carrying the break position.
    pub fn ensure_valid(&self, channel: &str) -> CustodiaResult<usize> {
        let result = self.verify(channel)?;
        if result.valid {
            Ok(result.entries_checked)
        } else {
            Err(CustodiaError::ChainBroken {
                channel: channel.to_string(),
                position: result.entries_checked,
            })
        }
    }

    fn check_anchor(&self, channel: &str, lines: &[String]) -> CustodiaResult<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let Some(anchor) = state.load(channel)? else {
            return Ok(());
        };
        let Some(tail) = lines.iter().rev().find(|l| !l.trim().is_empty()) else {
            warn!(
                channel = %channel,
                "chain-state anchor present but channel is empty"
            );
            return Ok(());
        };
        // The tail parsed during verification; a parse failure here would
        // already have invalidated the chain.
        if let Ok(sealed) = SealedRecord::from_line(tail) {
            if sealed.hash != anchor {
                warn!(
                    channel = %channel,
                    "chain-state anchor does not match the log tail (stale sidecar or in-flight append)"
                );
            }
        }
        Ok(())
    }
}
