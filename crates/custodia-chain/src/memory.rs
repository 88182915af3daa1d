//! In-memory implementation of `Appender` and `RecordSource`.
//!
//! `MemoryAppender` is the reference implementation of the append
//! contract: per-channel chains held in a `Vec` behind a single `Mutex`,
//! so the read-previous-hash → seal → push → advance sequence is one
//! critical section. It backs the file store's semantics and serves as
//! the test double for everything above the storage layer.

use std::collections::BTreeMap;
use std::sync::Mutex;

use custodia_contracts::{channel, AppendOutcome, CustodiaResult, LogRecord};
use custodia_core::{Appender, RecordSource};

use crate::hash::{seal, SEED_HASH};
use crate::sealed::SealedRecord;
use crate::verify::verify_records;

/// One channel's in-memory chain.
pub(crate) struct ChannelChain {
    pub(crate) records: Vec<SealedRecord>,
    pub(crate) last_hash: String,
}

impl ChannelChain {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            last_hash: SEED_HASH.to_string(),
        }
    }
}

/// An in-memory, append-only store of hash-chained records.
///
/// # Thread safety
///
/// All channels share one `Mutex`; appends from any number of threads are
/// serialized, so no two records can ever chain against the same previous
/// hash.
#[derive(Default)]
pub struct MemoryAppender {
    pub(crate) chains: Mutex<BTreeMap<String, ChannelChain>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a channel's sealed records in chain order.
    pub fn records(&self, channel: &str) -> Vec<SealedRecord> {
        let chains = self.chains.lock().expect("chain state lock poisoned");
        chains
            .get(channel)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }

    /// Verify one channel's chain as currently held in memory.
    pub fn verify_channel(&self, channel: &str) -> custodia_contracts::VerificationResult {
        let chains = self.chains.lock().expect("chain state lock poisoned");
        match chains.get(channel) {
            Some(chain) => verify_records(&chain.records),
            None => verify_records(&[]),
        }
    }
}

impl Appender for MemoryAppender {
    /// Append one record to its channel's chain.
    ///
    /// Seals the record against the channel's last hash, pushes it, and
    /// advances the cursor — all under the lock. Failures (an invalid
    /// channel name, an unserializable record) are reported in the
    /// outcome, never raised.
    fn append(&self, record: LogRecord) -> AppendOutcome {
        if let Err(e) = channel::validate(&record.channel) {
            return AppendOutcome::failed(e.to_string());
        }

        let mut chains = match self.chains.lock() {
            Ok(guard) => guard,
            Err(e) => return AppendOutcome::failed(format!("chain state lock poisoned: {}", e)),
        };

        let chain = chains
            .entry(record.channel.clone())
            .or_insert_with(ChannelChain::new);

        let sealed = match seal(record, &chain.last_hash) {
            Ok(sealed) => sealed,
            Err(e) => return AppendOutcome::failed(e.to_string()),
        };

        chain.last_hash = sealed.hash.clone();
        let hash = sealed.hash.clone();
        chain.records.push(sealed);

        AppendOutcome::ok(hash)
    }
}

impl RecordSource for MemoryAppender {
    fn channels(&self) -> CustodiaResult<Vec<String>> {
        let chains = self.chains.lock().expect("chain state lock poisoned");
        Ok(chains.keys().cloned().collect())
    }

    fn read_lines(&self, channel: &str) -> CustodiaResult<Vec<String>> {
        let chains = self.chains.lock().expect("chain state lock poisoned");
        match chains.get(channel) {
            Some(chain) => chain.records.iter().map(|r| r.to_line()).collect(),
            None => Ok(Vec::new()),
        }
    }
}
