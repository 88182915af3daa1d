//! # custodia-contracts
//!
//! Shared types, outcomes, and the error taxonomy for the Custodia
//! tamper-evident audit chain.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, canonical-format pins, and error
//! types.

pub mod channel;
pub mod detail;
pub mod error;
pub mod record;
pub mod report;

pub use detail::{DetailValue, Details, REDACTED_MARKER};
pub use error::{CustodiaError, CustodiaResult};
pub use record::{Actor, Level, LogRecord, Operation, Outcome, Subject};
pub use report::{AppendOutcome, VerificationResult};
