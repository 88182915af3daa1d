//! Channel names and validation.
//!
//! A channel is an independently-chained log stream. Each channel owns one
//! JSON-Lines file and one chain-state sidecar; two channels never share
//! state and never contend with each other.

use crate::error::{CustodiaError, CustodiaResult};

/// General audit trail: CRUD operations, logins, administrative actions.
pub const AUDIT: &str = "audit";

/// Protected-health-information access events, chained separately so the
/// PHI trail can be exported and verified on its own.
pub const PHI_ACCESS: &str = "phi_access";

/// Dashboard and reporting instrumentation (query timings, cache events).
pub const DASHBOARD: &str = "dashboard";

/// Maximum accepted channel name length.
pub const MAX_NAME_LEN: usize = 64;

/// Validate a channel name.
///
/// Channel names become file names (`{channel}.log`, `.{channel}_hash`),
/// so the accepted alphabet is restricted to `[a-z0-9_-]`, 1 to 64 bytes.
/// Dots are rejected in particular — archived segments are named
/// `{channel}.{stamp}.log` and must never collide with a live channel.
pub fn validate(name: &str) -> CustodiaResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(CustodiaError::ConfigError {
            reason: format!(
                "channel name must be 1..={} bytes, got {}",
                MAX_NAME_LEN,
                name.len()
            ),
        });
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-'))
    {
        return Err(CustodiaError::ConfigError {
            reason: format!("channel name '{}' contains invalid character '{}'", name, bad),
        });
    }
    Ok(())
}
