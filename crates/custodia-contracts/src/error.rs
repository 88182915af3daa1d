//! Error taxonomy for the Custodia audit chain.
//!
//! All fallible operations in the workspace return `CustodiaResult<T>`.
//! Variants carry enough context to produce actionable operator messages.
//!
//! Note the deliberate asymmetry: `Appender::append` does NOT return this
//! type. Audit failures must never abort the business operation that
//! triggered them, so the append path reports through `AppendOutcome`
//! instead. The variants here surface on the construction, verification,
//! and maintenance paths, where propagating is correct.

use thiserror::Error;

/// The unified error type for the Custodia crates.
#[derive(Debug, Error)]
pub enum CustodiaError {
    /// The redaction subsystem could not be built: an invalid content
    /// pattern, an empty marker, or a marker that matches one of the
    /// ruleset's own patterns (which would break idempotence).
    ///
    /// Redaction itself is total and never produces this — the closed
    /// `DetailValue` type leaves nothing to fail on at runtime.
    #[error("redaction failed: {reason}")]
    RedactionFailed { reason: String },

    /// An append to a channel did not complete.
    ///
    /// Internal to the append path; converted to a non-fatal
    /// `AppendOutcome` before it reaches the caller.
    #[error("append to channel '{channel}' failed: {reason}")]
    AppendFailed { channel: String, reason: String },

    /// Chain verification found a divergence.
    ///
    /// `position` is the 1-based index of the first record whose stored
    /// hash does not match the recomputed value. Never auto-repaired:
    /// the break is the evidence.
    #[error("chain broken in channel '{channel}' at record {position}")]
    ChainBroken { channel: String, position: usize },

    /// A record could not be serialized to, or deserialized from, its
    /// canonical JSON form.
    #[error("record serialization failed: {reason}")]
    Serialization { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The storage layer reported an I/O failure.
    #[error("storage error: {reason}")]
    Storage { reason: String },
}

/// Convenience alias used throughout the Custodia crates.
pub type CustodiaResult<T> = Result<T, CustodiaError>;
