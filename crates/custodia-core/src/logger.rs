//! The audit logging facade.
//!
//! `AuditLogger` is the one component business code talks to. It owns the
//! redactor(s) and the appender, stamps timestamps, and enforces the
//! pipeline order: details are redacted before the appender ever sees
//! them.
//!
//! There is deliberately no global instance and no static accessor —
//! construct one at the application's composition root and hand it out
//! (typically behind an `Arc`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use custodia_contracts::{
    channel, AppendOutcome, Actor, Details, Level, LogRecord, Operation, Outcome, Subject,
};

use crate::traits::{Appender, Redactor};

/// Dependency-injected audit logger.
///
/// One instance serves every channel. Redaction is pluggable per channel:
/// the default redactor applies everywhere unless a channel registers its
/// own ruleset.
///
/// Every method returns `AppendOutcome` and never panics or errors — a
/// failed audit write is reported, not thrown. Callers that must react to
/// audit loss inspect the outcome; everyone else carries on.
pub struct AuditLogger {
    appender: Arc<dyn Appender>,
    default_redactor: Arc<dyn Redactor>,
    channel_redactors: HashMap<String, Arc<dyn Redactor>>,
}

impl AuditLogger {
    pub fn new(appender: Arc<dyn Appender>, default_redactor: Arc<dyn Redactor>) -> Self {
        Self {
            appender,
            default_redactor,
            channel_redactors: HashMap::new(),
        }
    }

    /// Register a channel-specific redactor, replacing any previous one.
    pub fn with_channel_redactor(
        mut self,
        channel: impl Into<String>,
        redactor: Arc<dyn Redactor>,
    ) -> Self {
        self.channel_redactors.insert(channel.into(), redactor);
        self
    }

    /// Append one event to `channel`.
    ///
    /// Stamps the current UTC time, redacts `details` with the channel's
    /// redactor, and hands the record to the appender. The returned
    /// outcome says whether the chain advanced.
    #[allow(clippy::too_many_arguments)]
    pub fn log(
        &self,
        channel: &str,
        level: Level,
        operation: Operation,
        actor: Option<Actor>,
        subject: Option<Subject>,
        details: Details,
        outcome: Outcome,
    ) -> AppendOutcome {
        let redactor = self
            .channel_redactors
            .get(channel)
            .unwrap_or(&self.default_redactor);

        let record = LogRecord {
            timestamp: Utc::now(),
            channel: channel.to_string(),
            level,
            operation,
            actor,
            subject,
            details: redactor.redact(&details),
            outcome,
        };

        let result = self.appender.append(record);
        if !result.written {
            // Best-effort by policy: note the loss, continue.
            warn!(
                channel = %channel,
                error = result.error.as_deref().unwrap_or("unknown"),
                "audit append failed; business flow continues"
            );
        }
        result
    }

    // ── Typed helpers for the common call sites ───────────────────────────────

    /// A read of a business record, on the audit channel.
    pub fn access(&self, actor: Actor, subject: Subject, details: Details) -> AppendOutcome {
        self.log(
            channel::AUDIT,
            Level::Audit,
            Operation::read(),
            Some(actor),
            Some(subject),
            details,
            Outcome::success(),
        )
    }

    /// A create/update/delete of a business record, on the audit channel.
    pub fn modification(
        &self,
        operation: Operation,
        actor: Actor,
        subject: Subject,
        details: Details,
        outcome: Outcome,
    ) -> AppendOutcome {
        self.log(
            channel::AUDIT,
            Level::Audit,
            operation,
            Some(actor),
            Some(subject),
            details,
            outcome,
        )
    }

    /// A protected-health-information access, on its dedicated channel.
    pub fn phi_access(&self, actor: Actor, subject: Subject, details: Details) -> AppendOutcome {
        self.log(
            channel::PHI_ACCESS,
            Level::Security,
            Operation::phi_access(),
            Some(actor),
            Some(subject),
            details,
            Outcome::success(),
        )
    }

    /// An authentication attempt, on the audit channel.
    pub fn login(&self, actor: Actor, success: bool, details: Details) -> AppendOutcome {
        let (operation, outcome) = if success {
            (Operation::login_success(), Outcome::success())
        } else {
            (
                Operation::login_failure(),
                Outcome::failure("authentication failed"),
            )
        };
        self.log(
            channel::AUDIT,
            Level::Security,
            operation,
            Some(actor),
            None,
            details,
            outcome,
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
