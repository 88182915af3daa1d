//! Custodia — operator CLI for the tamper-evident audit chain.
//!
//! Subcommands:
//!   custodia verify [CHANNEL]    verify one channel's chain, or all
//!   custodia stats CHANNEL       aggregate counters for one channel
//!   custodia rotate CHANNEL      archive the live file, reset the chain
//!   custodia demo                append a sample clinical flow, then verify
//!
//! All subcommands operate on one log directory (--log-dir, default
//! ./custodia-logs). Exit status is non-zero when verification finds a
//! break.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use custodia_contracts::{
    channel, Actor, CustodiaResult, Details, Level, Operation, Outcome, Subject,
};
use custodia_core::{AuditLogger, RecordSource};
use custodia_redact::PhiRedactor;
use custodia_store::FileStore;
use custodia_verify::{ChainVerifier, ChannelStats};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Custodia — hash-chained, PHI-redacting audit logging.
#[derive(Parser)]
#[command(
    name = "custodia",
    about = "Tamper-evident audit chain: verify, inspect, rotate",
    long_about = "Operates on a directory of hash-chained JSON-Lines channels.\n\
                  Every record's SHA-256 hash commits to the previous record,\n\
                  so edits and deletions are detectable after the fact."
)]
struct Cli {
    /// Log directory holding channel files and chain-state sidecars.
    #[arg(long, default_value = "custodia-logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify a channel's hash chain, or every channel when omitted.
    Verify {
        /// Channel to verify (e.g. "audit", "phi_access").
        channel: Option<String>,
    },
    /// Print aggregate counters for one channel.
    Stats {
        channel: String,
    },
    /// Archive a channel's live file and reset its chain state.
    Rotate {
        channel: String,
    },
    /// Append a sample clinical flow across channels, then verify.
    Demo,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Structured logging; set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Verify { channel } => run_verify(&cli.log_dir, channel.as_deref()),
        Command::Stats { channel } => run_stats(&cli.log_dir, &channel),
        Command::Rotate { channel } => run_rotate(&cli.log_dir, &channel),
        Command::Demo => run_demo(&cli.log_dir),
    };

    match result {
        Ok(clean) if clean => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("custodia: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// Verify one or all channels. Returns false when any chain is broken.
fn run_verify(log_dir: &Path, channel: Option<&str>) -> CustodiaResult<bool> {
    let store = Arc::new(FileStore::new(log_dir)?);
    let verifier = ChainVerifier::new(store.clone()).with_chain_state(store);

    let results = match channel {
        Some(name) => vec![(name.to_string(), verifier.verify(name)?)],
        None => verifier.verify_all()?,
    };

    if results.is_empty() {
        println!("no channels found in {}", log_dir.display());
        return Ok(true);
    }

    let mut clean = true;
    for (name, result) in results {
        if result.valid {
            println!(
                "{:<12} OK      {} record(s) verified",
                name, result.entries_checked
            );
        } else {
            clean = false;
            println!(
                "{:<12} BROKEN  chain diverges at record {}",
                name,
                result.broken_at.unwrap_or(result.entries_checked)
            );
        }
    }
    Ok(clean)
}

fn run_stats(log_dir: &Path, channel: &str) -> CustodiaResult<bool> {
    let store = FileStore::new(log_dir)?;
    let lines = store.read_lines(channel)?;
    let stats = ChannelStats::from_lines(&lines);

    println!("channel: {}", channel);
    println!("  records:         {}", stats.total_records);
    println!("  malformed lines: {}", stats.malformed_lines);
    println!("  failures:        {}", stats.failures);
    println!("  slow operations: {}", stats.slow_operations);
    if let Some(rate) = stats.cache_hit_rate() {
        println!("  cache hit rate:  {:.1}%", rate * 100.0);
    }
    for (section, counts) in [
        ("by level", &stats.by_level),
        ("by operation", &stats.by_operation),
        ("by actor", &stats.by_actor),
    ] {
        if counts.is_empty() {
            continue;
        }
        println!("  {}:", section);
        for (key, count) in counts {
            println!("    {:<16} {}", key, count);
        }
    }
    Ok(true)
}

fn run_rotate(log_dir: &Path, channel: &str) -> CustodiaResult<bool> {
    let store = FileStore::new(log_dir)?;
    match store.rotate(channel)? {
        Some(archived) => println!("rotated '{}' -> {}", channel, archived.display()),
        None => println!("channel '{}' has no live file; chain state cleared", channel),
    }
    Ok(true)
}

/// Append a small but realistic clinical flow, then verify every channel.
///
/// The flow deliberately includes PHI-shaped details (a patient name, a
/// phone number) so the persisted lines demonstrate redaction.
fn run_demo(log_dir: &Path) -> CustodiaResult<bool> {
    let store = Arc::new(FileStore::new(log_dir)?);
    let logger = AuditLogger::new(store.clone(), Arc::new(PhiRedactor::builtin()));

    let physician = Actor::new("u-1001", "physician");
    let registrar = Actor::new("u-2002", "registrar");
    let patient = Subject::new("Patient", Uuid::new_v4().to_string());
    let encounter = Subject::new("Encounter", Uuid::new_v4().to_string());

    println!("appending demo flow to {} ...", log_dir.display());

    logger.login(physician.clone(), true, Details::new().with("method", "password"));

    logger.access(
        physician.clone(),
        patient.clone(),
        Details::new().with("section", "demographics"),
    );

    logger.phi_access(
        physician,
        patient,
        Details::new()
            .with("section", "lab_results")
            .with("reason", "treatment"),
    );

    // PHI in the details: the persisted record will carry markers, not
    // the name or the phone number.
    logger.modification(
        Operation::update(),
        registrar,
        encounter,
        Details::new()
            .with("patient_name", "Jane Doe")
            .with("note", "callback at 555-123-4567 after discharge"),
        Outcome::success(),
    );

    logger.login(
        Actor::bare("u-9999"),
        false,
        Details::new().with("method", "password").with("attempt", 3i64),
    );

    for (hit, ms) in [(true, 14i64), (false, 1850i64), (true, 9i64)] {
        logger.log(
            channel::DASHBOARD,
            Level::Info,
            Operation::read(),
            None,
            None,
            Details::new().with("cache_hit", hit).with("duration_ms", ms),
            Outcome::success(),
        );
    }

    println!();
    run_verify(log_dir, None)
}
