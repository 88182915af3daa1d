//! # custodia-verify
//!
//! Chain verification and channel statistics for the Custodia audit
//! trail.
//!
//! ## Overview
//!
//! [`ChainVerifier`] replays a channel from any
//! [`RecordSource`](custodia_core::RecordSource), recomputes every hash,
//! and reports the first point of divergence:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custodia_verify::ChainVerifier;
//!
//! let verifier = ChainVerifier::new(Arc::new(store));
//! let result = verifier.verify("audit")?;
//! // result: { valid, broken_at, entries_checked }
//! ```
//!
//! A broken chain is never auto-repaired — the break IS the evidence.
//! [`ChannelStats`] provides the read-only aggregation used by
//! dashboards: counts by level, operation, and actor, failure and
//! slow-operation counts, and cache hit rate.

pub mod engine;
pub mod stats;

pub use engine::{verify_lines, ChainVerifier};
pub use stats::{ChannelStats, SLOW_OPERATION_THRESHOLD_MS};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use chrono::Utc;
    use tempfile::TempDir;

    use custodia_chain::MemoryAppender;
    use custodia_contracts::{
        channel, Actor, CustodiaError, Details, Level, LogRecord, Operation, Outcome, Subject,
    };
    use custodia_core::{Appender, ChainStateStore};
    use custodia_store::FileStore;

    use super::{ChainVerifier, ChannelStats};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(channel_name: &str, payload: &str) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            channel: channel_name.to_string(),
            level: Level::Audit,
            operation: Operation::update(),
            actor: Some(Actor::new("u-3", "registrar")),
            subject: Some(Subject::new("Patient", "p-41")),
            details: Details::new().with("payload", payload),
            outcome: Outcome::success(),
        }
    }

    fn file_store_with(dir: &TempDir, payloads: &[&str]) -> Arc<FileStore> {
        let store = Arc::new(FileStore::new(dir.path()).unwrap());
        for payload in payloads {
            assert!(store.append(make_record(channel::AUDIT, payload)).written);
        }
        store
    }

    // ── Basic chain scenarios ─────────────────────────────────────────────────

    /// Append A, B, C with no concurrent writers; verification reports a
    /// fully valid chain of three.
    #[test]
    fn basic_chain_verifies() {
        let appender = Arc::new(MemoryAppender::new());
        for payload in ["A", "B", "C"] {
            appender.append(make_record(channel::AUDIT, payload));
        }

        let verifier = ChainVerifier::new(appender);
        let result = verifier.verify(channel::AUDIT).unwrap();

        assert!(result.valid);
        assert_eq!(result.broken_at, None);
        assert_eq!(result.entries_checked, 3);
    }

    /// An unknown channel verifies trivially: zero entries, valid.
    #[test]
    fn empty_channel_is_valid() {
        let verifier = ChainVerifier::new(Arc::new(MemoryAppender::new()));
        let result = verifier.verify("never_written").unwrap();
        assert!(result.valid);
        assert_eq!(result.entries_checked, 0);
    }

    // ── Tamper scenarios ──────────────────────────────────────────────────────

    /// The reference tamper scenario: append A, B, C; edit B's operation
    /// field directly on disk without recomputing hashes; verification
    /// breaks at position 2.
    #[test]
    fn on_disk_field_edit_is_detected() {
        let dir = TempDir::new().unwrap();
        let store = file_store_with(&dir, &["A", "B", "C"]);

        let path = store.log_path(channel::AUDIT);
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines: Vec<String> = contents.lines().map(String::from).collect();
        assert_eq!(lines.len(), 3);
        lines[1] = lines[1].replace("\"operation\":\"UPDATE\"", "\"operation\":\"DELETE\"");
        fs::write(&path, lines.join("\n") + "\n").unwrap();

        let verifier = ChainVerifier::new(store);
        let result = verifier.verify(channel::AUDIT).unwrap();

        assert!(!result.valid);
        assert_eq!(result.broken_at, Some(2));
        assert_eq!(result.entries_checked, 2);
    }

    /// A record deleted from the middle of the file breaks the chain at
    /// the record that follows it.
    #[test]
    fn deleted_record_is_detected() {
        let dir = TempDir::new().unwrap();
        let store = file_store_with(&dir, &["A", "B", "C"]);

        let path = store.log_path(channel::AUDIT);
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        fs::write(&path, format!("{}\n{}\n", lines[0], lines[2])).unwrap();

        let result = ChainVerifier::new(store).verify(channel::AUDIT).unwrap();
        assert!(!result.valid);
        assert_eq!(result.broken_at, Some(2));
    }

    /// A non-deserializable line is a mismatch at its position, not a
    /// distinct error class.
    #[test]
    fn corrupt_line_is_a_break() {
        let dir = TempDir::new().unwrap();
        let store = file_store_with(&dir, &["A", "B", "C"]);

        let path = store.log_path(channel::AUDIT);
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines: Vec<String> = contents.lines().map(String::from).collect();
        lines[2] = "garbage not json".to_string();
        fs::write(&path, lines.join("\n") + "\n").unwrap();

        let result = ChainVerifier::new(store).verify(channel::AUDIT).unwrap();
        assert!(!result.valid);
        assert_eq!(result.broken_at, Some(3));
    }

    /// ensure_valid maps a break to `ChainBroken` with the position.
    #[test]
    fn ensure_valid_errors_on_break() {
        let dir = TempDir::new().unwrap();
        let store = file_store_with(&dir, &["A", "B"]);

        let path = store.log_path(channel::AUDIT);
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines: Vec<String> = contents.lines().map(String::from).collect();
        lines[0] = lines[0].replace("\"payload\":\"A\"", "\"payload\":\"Z\"");
        fs::write(&path, lines.join("\n") + "\n").unwrap();

        let verifier = ChainVerifier::new(store);
        match verifier.ensure_valid(channel::AUDIT) {
            Err(CustodiaError::ChainBroken { channel, position }) => {
                assert_eq!(channel, "audit");
                assert_eq!(position, 1);
            }
            other => panic!("expected ChainBroken, got {:?}", other.map(|_| ())),
        }
    }

    /// ensure_valid returns the entry count for an intact chain.
    #[test]
    fn ensure_valid_returns_count() {
        let dir = TempDir::new().unwrap();
        let store = file_store_with(&dir, &["A", "B"]);
        let verifier = ChainVerifier::new(store);
        assert_eq!(verifier.ensure_valid(channel::AUDIT).unwrap(), 2);
    }

    // ── verify_all & anchor check ─────────────────────────────────────────────

    #[test]
    fn verify_all_covers_every_channel() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(dir.path()).unwrap());
        store.append(make_record(channel::AUDIT, "a"));
        store.append(make_record(channel::PHI_ACCESS, "p"));
        store.append(make_record(channel::PHI_ACCESS, "q"));

        let results = ChainVerifier::new(store).verify_all().unwrap();
        assert_eq!(results.len(), 2);
        for (channel_name, result) in &results {
            assert!(result.valid, "channel '{}' must verify", channel_name);
        }
    }

    /// A stale sidecar does not invalidate an intact chain — the records
    /// themselves prove out; the anchor mismatch is an operator warning.
    #[test]
    fn stale_anchor_does_not_invalidate_chain() {
        let dir = TempDir::new().unwrap();
        let store = file_store_with(&dir, &["A", "B"]);
        store.store(channel::AUDIT, &"ef".repeat(32)).unwrap();

        let verifier =
            ChainVerifier::new(store.clone()).with_chain_state(store);
        let result = verifier.verify(channel::AUDIT).unwrap();

        assert!(result.valid);
        assert_eq!(result.entries_checked, 2);
    }

    // ── Statistics ────────────────────────────────────────────────────────────

    #[test]
    fn stats_reduce_counts_dimensions() {
        let appender = Arc::new(MemoryAppender::new());

        let mut failed = make_record(channel::DASHBOARD, "slow kpi");
        failed.level = Level::Error;
        failed.operation = Operation::read();
        failed.outcome = Outcome::failure("query timeout");
        failed.details = Details::new().with("duration_ms", 2_500i64);
        appender.append(failed);

        let mut hit = make_record(channel::DASHBOARD, "cache hit");
        hit.actor = Some(Actor::new("u-9", "analyst"));
        hit.details = Details::new().with("cache_hit", true).with("duration_ms", 12i64);
        appender.append(hit);

        let mut miss = make_record(channel::DASHBOARD, "cache miss");
        miss.actor = None;
        miss.details = Details::new().with("cache_hit", false);
        appender.append(miss);

        let records = appender.records(channel::DASHBOARD);
        let stats = ChannelStats::reduce(&records);

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.slow_operations, 1);
        assert_eq!(stats.by_level.get("ERROR"), Some(&1));
        assert_eq!(stats.by_level.get("AUDIT"), Some(&2));
        assert_eq!(stats.by_operation.get("READ"), Some(&1));
        assert_eq!(stats.by_operation.get("UPDATE"), Some(&2));
        assert_eq!(stats.by_actor.get("u-9"), Some(&1));
        assert_eq!(stats.by_actor.get("u-3"), Some(&1));
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hit_rate(), Some(0.5));
    }

    /// Malformed lines are tallied, not fatal, and do not reach the
    /// dimension counters.
    #[test]
    fn stats_count_malformed_lines() {
        let lines = vec![
            "not json at all".to_string(),
            String::new(),
        ];
        let stats = ChannelStats::from_lines(&lines);
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.cache_hit_rate(), None);
    }
}
