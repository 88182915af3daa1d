//! # custodia-core
//!
//! Component traits and the audit logging facade for the Custodia
//! tamper-evident logging core.
//!
//! ## Overview
//!
//! The core defines the seams — `Redactor`, `Appender`, `RecordSource`,
//! `ChainStateStore` — and one concrete component, `AuditLogger`, which
//! enforces the pipeline order (redact, then append) and the propagation
//! policy (audit failures are reported as outcomes, never thrown).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custodia_core::AuditLogger;
//!
//! let logger = AuditLogger::new(appender, redactor);
//! let outcome = logger.phi_access(actor, subject, details);
//! if !outcome.written {
//!     // audit loss noted; the business operation proceeds regardless
//! }
//! ```

pub mod logger;
pub mod traits;

pub use logger::AuditLogger;
pub use traits::{Appender, ChainStateStore, Redactor, RecordSource};
