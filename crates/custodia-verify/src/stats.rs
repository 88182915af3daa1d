//! Read-only aggregation over a channel's records.
//!
//! Pure reducers: no invariants beyond "do not mutate the stream while
//! reducing". Malformed lines are counted and skipped — statistics are a
//! convenience view, not an integrity check; the verifier owns integrity.

use std::collections::BTreeMap;

use serde::Serialize;

use custodia_chain::SealedRecord;
use custodia_contracts::{DetailValue, LogRecord};

/// Operations slower than this (per their `duration_ms` detail) count as
/// slow.
pub const SLOW_OPERATION_THRESHOLD_MS: i64 = 1_000;

/// Aggregate counters for one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelStats {
    pub total_records: usize,
    /// Lines that did not parse as sealed records.
    pub malformed_lines: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_operation: BTreeMap<String, usize>,
    pub by_actor: BTreeMap<String, usize>,
    /// Records whose outcome reported failure.
    pub failures: usize,
    /// Records with a `duration_ms` detail above the slow threshold.
    pub slow_operations: usize,
    /// Records with a boolean `cache_hit` detail, split by value
    /// (dashboard channel convention).
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ChannelStats {
    /// Reduce raw persisted lines. Blank lines are ignored; unparseable
    /// lines are tallied in `malformed_lines`.
    pub fn from_lines(lines: &[String]) -> Self {
        let mut stats = Self::default();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            match SealedRecord::from_line(line) {
                Ok(sealed) => stats.absorb(&sealed.record),
                Err(_) => stats.malformed_lines += 1,
            }
        }
        stats
    }

    /// Reduce already-parsed records.
    pub fn reduce(records: &[SealedRecord]) -> Self {
        let mut stats = Self::default();
        for sealed in records {
            stats.absorb(&sealed.record);
        }
        stats
    }

    fn absorb(&mut self, record: &LogRecord) {
        self.total_records += 1;
        *self.by_level.entry(record.level.to_string()).or_default() += 1;
        *self
            .by_operation
            .entry(record.operation.to_string())
            .or_default() += 1;
        if let Some(actor) = &record.actor {
            *self.by_actor.entry(actor.id.clone()).or_default() += 1;
        }
        if !record.outcome.success {
            self.failures += 1;
        }

        let slow = match record.details.get("duration_ms") {
            Some(DetailValue::Int(ms)) => *ms > SLOW_OPERATION_THRESHOLD_MS,
            Some(DetailValue::Float(ms)) => *ms > SLOW_OPERATION_THRESHOLD_MS as f64,
            _ => false,
        };
        if slow {
            self.slow_operations += 1;
        }

        match record.details.get("cache_hit") {
            Some(DetailValue::Bool(true)) => self.cache_hits += 1,
            Some(DetailValue::Bool(false)) => self.cache_misses += 1,
            _ => {}
        }
    }

    /// Fraction of cache events that were hits, or `None` when the
    /// channel tracked no cache events.
    pub fn cache_hit_rate(&self) -> Option<f64> {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            None
        } else {
            Some(self.cache_hits as f64 / total as f64)
        }
    }
}
