//! The file-backed channel store.
//!
//! One JSON-Lines file per channel plus one chain-state sidecar, both in
//! a single log directory. The append critical section — read previous
//! hash, seal, durable write, advance cursor — is guarded twice: a
//! per-channel in-process mutex serializes threads, and an exclusive
//! `fs2` lock on the channel file serializes processes.
//!
//! Durability ordering is fixed: the cursor is advanced only after the
//! line write has been flushed with `sync_data`. A crash after the write
//! but before the cursor update leaves a stale sidecar, which the next
//! append repairs from the log tail; the chain itself is never at risk
//! from that window.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use fs2::FileExt;
use tracing::{error, info, warn};

use custodia_chain::{seal, SealedRecord, SEED_HASH};
use custodia_contracts::{
    channel, AppendOutcome, CustodiaError, CustodiaResult, LogRecord,
};
use custodia_core::{Appender, ChainStateStore, RecordSource};

use crate::state;

/// File extension for live and archived channel files.
const LOG_SUFFIX: &str = ".log";

/// Durable, hash-chained channel storage rooted at one directory.
pub struct FileStore {
    directory: PathBuf,
    /// Per-channel append locks, created lazily. Guards threads within
    /// this process; the file lock guards across processes.
    channels: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileStore {
    /// Open a store rooted at `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>) -> CustodiaResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| CustodiaError::Storage {
            reason: format!(
                "failed to create log directory '{}': {}",
                directory.display(),
                e
            ),
        })?;
        Ok(Self {
            directory,
            channels: Mutex::new(HashMap::new()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of a channel's live file.
    pub fn log_path(&self, channel: &str) -> PathBuf {
        self.directory.join(format!("{}{}", channel, LOG_SUFFIX))
    }

    fn channel_lock(&self, channel: &str) -> CustodiaResult<Arc<Mutex<()>>> {
        let mut map = self
            .channels
            .lock()
            .map_err(|e| CustodiaError::AppendFailed {
                channel: channel.to_string(),
                reason: format!("channel registry lock poisoned: {}", e),
            })?;
        Ok(Arc::clone(map.entry(channel.to_string()).or_default()))
    }

    /// The previous hash for an append: the sidecar when present, else
    /// re-derived from the last well-formed line of the log, else the
    /// seed. Must be called with the channel's locks held.
    fn previous_hash(&self, channel: &str) -> CustodiaResult<String> {
        if let Some(hash) = state::load(&self.directory, channel)? {
            return Ok(hash);
        }
        self.recover_last_hash(channel)
    }

    fn recover_last_hash(&self, channel: &str) -> CustodiaResult<String> {
        let path = self.log_path(channel);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SEED_HASH.to_string())
            }
            Err(e) => {
                return Err(CustodiaError::Storage {
                    reason: format!("failed to open '{}': {}", path.display(), e),
                })
            }
        };

        let reader = BufReader::new(file);
        let mut last = SEED_HASH.to_string();
        for line in reader.lines() {
            let line = line.map_err(|e| CustodiaError::Storage {
                reason: format!("failed to read '{}': {}", path.display(), e),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            // Skip unparseable tails (e.g. a torn final write); the chain
            // anchor is the last record that round-trips.
            if let Ok(sealed) = SealedRecord::from_line(&line) {
                last = sealed.hash;
            }
        }
        warn!(channel = %channel, "chain state rebuilt from log tail");
        Ok(last)
    }

    fn append_inner(&self, record: &LogRecord) -> CustodiaResult<String> {
        let channel_name = record.channel.clone();
        channel::validate(&channel_name)?;

        let lock = self.channel_lock(&channel_name)?;
        let _guard = lock.lock().map_err(|e| CustodiaError::AppendFailed {
            channel: channel_name.clone(),
            reason: format!("channel lock poisoned: {}", e),
        })?;

        let path = self.log_path(&channel_name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CustodiaError::Storage {
                reason: format!("failed to open '{}': {}", path.display(), e),
            })?;

        file.lock_exclusive().map_err(|e| CustodiaError::Storage {
            reason: format!("failed to lock '{}': {}", path.display(), e),
        })?;
        let result = self.append_locked(&channel_name, record, &mut file);
        // Releases with the handle anyway; unlock eagerly so another
        // process is not held through our outcome handling.
        let _ = FileExt::unlock(&file);
        result
    }

    fn append_locked(
        &self,
        channel: &str,
        record: &LogRecord,
        file: &mut File,
    ) -> CustodiaResult<String> {
        let prev = self.previous_hash(channel)?;
        let sealed = seal(record.clone(), &prev)?;
        let line = sealed.to_line()?;

        // One write call for line + newline, then force it to disk.
        let mut buf = line.into_bytes();
        buf.push(b'\n');
        file.write_all(&buf).map_err(|e| CustodiaError::Storage {
            reason: format!("failed to append record: {}", e),
        })?;
        file.sync_data().map_err(|e| CustodiaError::Storage {
            reason: format!("failed to sync record: {}", e),
        })?;

        // The record is durable from here on. If the cursor update fails,
        // clear the sidecar so the next append rebuilds from the log tail
        // instead of chaining against a stale anchor.
        if let Err(e) = state::store(&self.directory, channel, &sealed.hash) {
            warn!(
                channel = %channel,
                error = %e,
                "chain-state update failed after durable write; clearing sidecar"
            );
            let _ = state::reset(&self.directory, channel);
        }

        Ok(sealed.hash)
    }

    /// Archive a channel's live file and reset its chain state.
    ///
    /// The live file is renamed to `{channel}.{UTC-stamp}.log` and the
    /// sidecar removed, so the next append starts a fresh chain from the
    /// seed. The archived segment keeps its internal chain and verifies
    /// standalone. Returns the archive path, or `None` when the channel
    /// has no live file.
    pub fn rotate(&self, channel: &str) -> CustodiaResult<Option<PathBuf>> {
        channel::validate(channel)?;

        let lock = self.channel_lock(channel)?;
        let _guard = lock.lock().map_err(|e| CustodiaError::AppendFailed {
            channel: channel.to_string(),
            reason: format!("channel lock poisoned: {}", e),
        })?;

        let live = self.log_path(channel);
        if !live.exists() {
            state::reset(&self.directory, channel)?;
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%6fZ");
        let archived = self
            .directory
            .join(format!("{}.{}{}", channel, stamp, LOG_SUFFIX));
        fs::rename(&live, &archived).map_err(|e| CustodiaError::Storage {
            reason: format!(
                "failed to archive '{}' as '{}': {}",
                live.display(),
                archived.display(),
                e
            ),
        })?;
        state::reset(&self.directory, channel)?;

        info!(channel = %channel, archive = %archived.display(), "channel rotated");
        Ok(Some(archived))
    }
}

// ── Appender impl ─────────────────────────────────────────────────────────────

impl Appender for FileStore {
    /// Durably append one record to its channel's chain.
    ///
    /// Failures are reported in the outcome, never raised: the record is
    /// echoed to stderr as a last-resort sink so the event is not
    /// silently lost, and chain state is left untouched.
    fn append(&self, record: LogRecord) -> AppendOutcome {
        match self.append_inner(&record) {
            Ok(hash) => AppendOutcome::ok(hash),
            Err(e) => {
                error!(
                    channel = %record.channel,
                    error = %e,
                    "durable append failed"
                );
                fallback_to_stderr(&record, &e);
                AppendOutcome::failed(e.to_string())
            }
        }
    }
}

/// Minimal always-available sink for records that could not be chained.
///
/// Unchained and unhashed — this exists for operators reconstructing
/// events after an outage, not for the verifier.
fn fallback_to_stderr(record: &LogRecord, reason: &CustodiaError) {
    let payload =
        serde_json::to_string(record).unwrap_or_else(|_| format!("{:?}", record));
    eprintln!(
        "custodia: audit append failed ({}); unchained record: {}",
        reason, payload
    );
}

// ── RecordSource impl ─────────────────────────────────────────────────────────

impl RecordSource for FileStore {
    /// Live channels only: archived segments carry a stamp in their file
    /// name, which is not a valid channel name and is therefore skipped.
    fn channels(&self) -> CustodiaResult<Vec<String>> {
        let entries = fs::read_dir(&self.directory).map_err(|e| CustodiaError::Storage {
            reason: format!(
                "failed to list log directory '{}': {}",
                self.directory.display(),
                e
            ),
        })?;

        let mut channels = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CustodiaError::Storage {
                reason: format!("failed to read directory entry: {}", e),
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(LOG_SUFFIX) else {
                continue;
            };
            if channel::validate(stem).is_ok() {
                channels.push(stem.to_string());
            }
        }
        channels.sort();
        Ok(channels)
    }

    fn read_lines(&self, channel: &str) -> CustodiaResult<Vec<String>> {
        channel::validate(channel)?;
        let path = self.log_path(channel);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CustodiaError::Storage {
                    reason: format!("failed to open '{}': {}", path.display(), e),
                })
            }
        };

        BufReader::new(file)
            .lines()
            .map(|line| {
                line.map_err(|e| CustodiaError::Storage {
                    reason: format!("failed to read '{}': {}", path.display(), e),
                })
            })
            .collect()
    }
}

// ── ChainStateStore impl ──────────────────────────────────────────────────────

impl ChainStateStore for FileStore {
    fn load(&self, channel: &str) -> CustodiaResult<Option<String>> {
        state::load(&self.directory, channel)
    }

    fn store(&self, channel: &str, hash: &str) -> CustodiaResult<()> {
        state::store(&self.directory, channel, hash)
    }

    fn reset(&self, channel: &str) -> CustodiaResult<()> {
        state::reset(&self.directory, channel)
    }
}
