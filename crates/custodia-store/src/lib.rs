//! # custodia-store
//!
//! Durable, file-backed storage for the Custodia audit chain.
//!
//! ## Overview
//!
//! [`FileStore`] implements the [`Appender`](custodia_core::Appender),
//! [`RecordSource`](custodia_core::RecordSource), and
//! [`ChainStateStore`](custodia_core::ChainStateStore) traits over a
//! single log directory:
//!
//! - `{channel}.log` — one JSON object per line, UTF-8, `hash` last
//! - `.{channel}_hash` — the chain-state sidecar: the last record's hash
//!   as a raw string
//!
//! Appends are serialized per channel (in-process mutex + exclusive file
//! lock), written durably (`write_all` + `sync_data`), and only then is
//! the sidecar advanced. Append failures surface as outcomes, never as
//! errors or panics, with the lost record echoed to stderr.

mod state;
pub mod store;

pub use store::FileStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
