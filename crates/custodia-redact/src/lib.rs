//! # custodia-redact
//!
//! PHI redaction for the Custodia audit chain.
//!
//! ## Overview
//!
//! This crate provides [`PhiRedactor`], which implements the
//! [`Redactor`](custodia_core::Redactor) trait. Redaction has two layers:
//!
//! 1. **Field rules** — case-insensitive key substrings (names, SSNs,
//!    birth dates, addresses, phones, emails, MRNs, insurance numbers,
//!    employers). A matching key's value is replaced with `[REDACTED]`
//!    whatever its type.
//! 2. **Content rules** — regular expressions applied in fixed order to
//!    every remaining string value, at any nesting depth: SSN-, phone-,
//!    email-, and date-shaped substrings get kind-specific markers.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use custodia_redact::PhiRedactor;
//! use custodia_core::Redactor;
//!
//! let engine = PhiRedactor::builtin();
//! let clean = engine.redact(&details);
//! ```
//!
//! Channels with different coverage load their own ruleset from TOML via
//! [`RedactionRuleset::from_file`]; invalid patterns and markers that
//! would break idempotence are rejected at load time, so redaction at
//! runtime never fails.

pub mod engine;
pub mod ruleset;

pub use engine::PhiRedactor;
pub use ruleset::{ContentRule, ContentRuleConfig, RedactionRuleset, RulesetConfig};
