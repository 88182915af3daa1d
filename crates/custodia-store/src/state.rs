//! Chain-state sidecar persistence.
//!
//! Each channel's cursor lives in `{log_directory}/.{channel}_hash`: the
//! raw lowercase hex hash of the channel's most recent record, nothing
//! else. The sidecar exists so an append can learn the previous hash
//! without scanning the whole log.
//!
//! Writes go through a temp-file-and-rename so a torn write can never
//! leave a half-hash behind. A sidecar that is nonetheless unreadable or
//! implausible is treated as missing — the store rebuilds it from the log
//! tail rather than chaining against garbage.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use custodia_contracts::{CustodiaError, CustodiaResult};

pub(crate) fn sidecar_path(directory: &Path, channel: &str) -> PathBuf {
    directory.join(format!(".{}_hash", channel))
}

/// True for a 64-char lowercase-insensitive hex string.
fn is_plausible_hash(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Load the persisted cursor, or `None` when absent or implausible.
pub(crate) fn load(directory: &Path, channel: &str) -> CustodiaResult<Option<String>> {
    let path = sidecar_path(directory, channel);
    match fs::read_to_string(&path) {
        Ok(contents) => {
            let hash = contents.trim().to_string();
            if is_plausible_hash(&hash) {
                Ok(Some(hash))
            } else {
                warn!(
                    channel = %channel,
                    path = %path.display(),
                    "chain-state sidecar is corrupt; treating as missing"
                );
                Ok(None)
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CustodiaError::Storage {
            reason: format!("failed to read chain state '{}': {}", path.display(), e),
        }),
    }
}

/// Persist `hash` as the channel's cursor (temp file + rename).
pub(crate) fn store(directory: &Path, channel: &str, hash: &str) -> CustodiaResult<()> {
    let path = sidecar_path(directory, channel);
    let tmp = directory.join(format!(".{}_hash.tmp", channel));

    fs::write(&tmp, hash).map_err(|e| CustodiaError::Storage {
        reason: format!("failed to write chain state '{}': {}", tmp.display(), e),
    })?;
    fs::rename(&tmp, &path).map_err(|e| CustodiaError::Storage {
        reason: format!("failed to commit chain state '{}': {}", path.display(), e),
    })?;
    Ok(())
}

/// Remove the channel's cursor. Absence is not an error.
pub(crate) fn reset(directory: &Path, channel: &str) -> CustodiaResult<()> {
    let path = sidecar_path(directory, channel);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CustodiaError::Storage {
            reason: format!("failed to reset chain state '{}': {}", path.display(), e),
        }),
    }
}
