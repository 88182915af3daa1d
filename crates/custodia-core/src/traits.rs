//! Core trait definitions for the Custodia pipeline.
//!
//! These four traits define the seams of the logging core:
//!
//! - `Redactor`        — strips PHI from a payload before anything persists it
//! - `Appender`        — serializes, chains, and durably writes one record
//! - `RecordSource`    — read-only replay of a channel's persisted stream
//! - `ChainStateStore` — the per-channel last-hash cursor
//!
//! The `AuditLogger` facade wires the first two together in the correct
//! order: details reach an `Appender` only after passing through a
//! `Redactor`. The last two exist for the verifier and for maintenance
//! tooling; appenders use their own state store internally.

use custodia_contracts::{AppendOutcome, CustodiaResult, Details, LogRecord};

/// Removes or masks identifiable content from a details payload.
///
/// Implementations must be pure and deterministic for a given ruleset, and
/// idempotent: redacting already-redacted content is a no-op. They must
/// never fail — an unclassifiable input is treated as wholly sensitive,
/// not leaked and not an error.
pub trait Redactor: Send + Sync {
    fn redact(&self, details: &Details) -> Details;
}

/// Appends one record to its channel's hash chain.
///
/// The full append — read previous hash, compute this record's hash,
/// durable single-line write, advance chain state — is one critical
/// section per channel. Implementations must serialize concurrent appends
/// to the same channel; two interleaved appends chaining against the same
/// stale previous hash silently corrupt the chain.
///
/// Returns `AppendOutcome` rather than `Result` deliberately: an audit
/// failure must never abort the business operation that triggered it.
/// Implementations report failure in the outcome, route the lost record to
/// a fallback sink, and leave chain state untouched.
pub trait Appender: Send + Sync {
    fn append(&self, record: LogRecord) -> AppendOutcome;
}

/// Read-only access to a channel's persisted record stream, in append
/// (= chain) order.
pub trait RecordSource: Send + Sync {
    /// All channels this source currently holds records for.
    fn channels(&self) -> CustodiaResult<Vec<String>>;

    /// The raw persisted lines for one channel, oldest first. A channel
    /// with no records yields an empty vector, not an error.
    ///
    /// Lines are returned unparsed so the verifier can classify a
    /// non-deserializable line as a break at its exact position.
    fn read_lines(&self, channel: &str) -> CustodiaResult<Vec<String>>;
}

/// The persisted per-channel cursor holding the most recent record's hash.
///
/// Created lazily on first append; read-modify-write on every append;
/// reset only as part of explicit rotation or archival.
pub trait ChainStateStore: Send + Sync {
    /// The last hash for `channel`, or `None` when no state is persisted.
    fn load(&self, channel: &str) -> CustodiaResult<Option<String>>;

    /// Persist `hash` as the channel's new cursor. Must only be called
    /// after the corresponding record write is confirmed durable.
    fn store(&self, channel: &str, hash: &str) -> CustodiaResult<()>;

    /// Remove the channel's cursor (rotation/archival only).
    fn reset(&self, channel: &str) -> CustodiaResult<()>;
}
