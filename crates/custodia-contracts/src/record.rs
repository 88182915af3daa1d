//! The audit record and its field types.
//!
//! `LogRecord` is what a caller hands to the appender: everything except
//! the chain hash, which is computed, never supplied. Field declaration
//! order here IS the canonical serialization order — do not reorder fields
//! without understanding that every stored hash commits to this layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detail::Details;

/// Severity / category tag for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Info,
    Warning,
    Error,
    Audit,
    Security,
    Critical,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Audit => "AUDIT",
            Self::Security => "SECURITY",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Symbolic action name.
///
/// An open set: the constructors cover the operations the audit trail is
/// queried by, and `Operation::new` admits anything else a caller needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation(pub String);

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn create() -> Self {
        Self::new("CREATE")
    }

    pub fn read() -> Self {
        Self::new("READ")
    }

    pub fn update() -> Self {
        Self::new("UPDATE")
    }

    pub fn delete() -> Self {
        Self::new("DELETE")
    }

    pub fn login_success() -> Self {
        Self::new("LOGIN_SUCCESS")
    }

    pub fn login_failure() -> Self {
        Self::new("LOGIN_FAILURE")
    }

    pub fn phi_access() -> Self {
        Self::new("PHI_ACCESS")
    }

    pub fn export() -> Self {
        Self::new("EXPORT")
    }

    pub fn break_glass() -> Self {
        Self::new("BREAK_GLASS")
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The acting user. Absent for system-initiated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User identifier (application-level, not PHI).
    pub id: String,
    /// Role at the time of the action (e.g. "physician", "registrar").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Some(role.into()),
        }
    }

    /// An actor with no recorded role.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: None,
        }
    }
}

/// The entity acted upon, e.g. kind "Patient" with a UUID identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub kind: String,
    pub id: String,
}

impl Subject {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Success/failure outcome of the audited operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// One structured audit record, minus its chain hash.
///
/// The hash is a pure function of every field here plus the preceding
/// record's hash in the same channel; it lives on `SealedRecord` in
/// custodia-chain, not here, so an unhashed record cannot be mistaken
/// for a persisted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Event time, UTC, microsecond precision, pinned format.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// The chain this record belongs to.
    pub channel: String,
    pub level: Level,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    /// Supplementary fields. Must already be redacted by the time an
    /// appender sees this record.
    pub details: Details,
    pub outcome: Outcome,
}

/// Pinned timestamp (de)serialization.
///
/// `DateTime<Utc>` default serde emits a variable number of fractional
/// digits, which would make serialization non-canonical: the same logical
/// record could hash differently across processes. This module pins the
/// format to exactly six fractional digits, always UTC, always `Z`.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// `2026-08-07T14:03:21.000142Z`
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
            .map_err(serde::de::Error::custom)
    }
}
