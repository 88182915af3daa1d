//! # custodia-chain
//!
//! Canonical serialization, SHA-256 chain hashing, and chain verification
//! for the Custodia audit trail.
//!
//! ## Overview
//!
//! Every appended record is sealed into a hash chain: its hash commits to
//! the record's canonical JSON plus the previous record's hash. Tampering
//! with any persisted field — even a single byte — breaks recomputation
//! for that record and is reported by [`verify_records`] at its exact
//! position.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custodia_chain::{seal, verify_records, SEED_HASH};
//!
//! let first = seal(record_a, SEED_HASH)?;
//! let second = seal(record_b, &first.hash)?;
//! assert!(verify_records(&[first, second]).valid);
//! ```

pub mod hash;
pub mod memory;
pub mod sealed;
pub mod verify;

pub use hash::{canonical_bytes, hash_record, seal, SEED_HASH};
pub use memory::MemoryAppender;
pub use sealed::SealedRecord;
pub use verify::verify_records;

// ── Tests ─────────────────────────────────────────────────────────────────────
