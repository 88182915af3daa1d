//! Redaction ruleset: configuration schema and compiled form.
//!
//! A ruleset has two halves:
//!
//! - **Field rules** — case-insensitive substring patterns matched against
//!   map keys. A matching key's value is replaced wholesale with the
//!   redaction marker, whatever its type.
//! - **Content rules** — regular expressions applied to every remaining
//!   string value, in declaration order. Each match is replaced with the
//!   rule's own marker.
//!
//! Rulesets can be declared in TOML. The built-in ruleset covers the PHI
//! surface of a clinical record system; a channel that needs different
//! coverage loads its own file.
//!
//! Example:
//! ```toml
//! field_patterns = ["ssn", "patient_name"]
//!
//! [[content_rules]]
//! name = "ssn"
//! pattern = '\b\d{3}-\d{2}-\d{4}\b'
//! marker = "[SSN-REDACTED]"
//! ```

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use custodia_contracts::{CustodiaError, CustodiaResult, REDACTED_MARKER};

/// Field-name patterns always redacted by the built-in ruleset.
///
/// Matched as case-insensitive substrings, so `home_phone` and
/// `PatientName` are caught by `phone` and `patient_name`. The list errs
/// on the side of over-redaction: an audit detail lost to a broad pattern
/// is an inconvenience, a leaked identifier is a breach.
pub const BUILTIN_FIELD_PATTERNS: &[&str] = &[
    "patient_name",
    "first_name",
    "last_name",
    "middle_name",
    "full_name",
    "ssn",
    "social_security",
    "dob",
    "date_of_birth",
    "birth_date",
    "address",
    "street",
    "zip_code",
    "postal_code",
    "phone",
    "fax",
    "email",
    "mrn",
    "medical_record",
    "insurance",
    "policy_number",
    "member_id",
    "subscriber_id",
    "employer",
    "emergency_contact",
    "next_of_kin",
];

/// One content rule as declared in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRuleConfig {
    /// Stable identifier, used in error messages.
    pub name: String,
    /// Regular expression applied to string values.
    pub pattern: String,
    /// Replacement for every match (e.g. `[SSN-REDACTED]`).
    pub marker: String,
}

/// The top-level structure deserialized from a TOML ruleset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesetConfig {
    /// Case-insensitive key substrings whose values are always redacted.
    #[serde(default)]
    pub field_patterns: Vec<String>,
    /// Ordered content rules. Declaration order is application order.
    #[serde(default)]
    pub content_rules: Vec<ContentRuleConfig>,
}

/// A compiled content rule.
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub name: String,
    pub regex: Regex,
    pub marker: String,
}

/// A compiled, validated redaction ruleset.
///
/// Compilation front-loads every failure mode: invalid regexes, empty
/// markers, and markers that would themselves match a pattern (which would
/// break idempotence) are all rejected here, so redaction at runtime is
/// total.
#[derive(Debug, Clone)]
pub struct RedactionRuleset {
    field_patterns: Vec<String>,
    content_rules: Vec<ContentRule>,
}

impl RedactionRuleset {
    /// The built-in PHI ruleset: the field patterns above plus content
    /// rules for SSN-, phone-, email-, and date-shaped substrings, applied
    /// in that order.
    pub fn builtin() -> Self {
        let config = RulesetConfig {
            field_patterns: BUILTIN_FIELD_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_rules: vec![
                ContentRuleConfig {
                    name: "ssn".to_string(),
                    pattern: r"\b\d{3}-\d{2}-\d{4}\b".to_string(),
                    marker: "[SSN-REDACTED]".to_string(),
                },
                ContentRuleConfig {
                    name: "phone".to_string(),
                    pattern: r"\(?\d{3}\)?[-.\s]\d{3}[-.\s]?\d{4}\b".to_string(),
                    marker: "[PHONE-REDACTED]".to_string(),
                },
                ContentRuleConfig {
                    name: "email".to_string(),
                    pattern: r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}".to_string(),
                    marker: "[EMAIL-REDACTED]".to_string(),
                },
                ContentRuleConfig {
                    name: "date".to_string(),
                    pattern: r"\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{4}\b".to_string(),
                    marker: "[DATE-REDACTED]".to_string(),
                },
            ],
        };
        Self::from_config(config).expect("built-in ruleset must always compile")
    }

    /// Compile and validate a configuration.
    ///
    /// Returns `RedactionFailed` for an invalid regex, an empty marker or
    /// field pattern, or a marker that any rule's pattern matches.
    pub fn from_config(config: RulesetConfig) -> CustodiaResult<Self> {
        let mut field_patterns = Vec::with_capacity(config.field_patterns.len());
        for pattern in &config.field_patterns {
            if pattern.is_empty() {
                return Err(CustodiaError::RedactionFailed {
                    reason: "field pattern must not be empty".to_string(),
                });
            }
            field_patterns.push(pattern.to_lowercase());
        }

        let mut content_rules = Vec::with_capacity(config.content_rules.len());
        for rule in &config.content_rules {
            if rule.marker.is_empty() {
                return Err(CustodiaError::RedactionFailed {
                    reason: format!("content rule '{}' has an empty marker", rule.name),
                });
            }
            let regex = Regex::new(&rule.pattern).map_err(|e| CustodiaError::RedactionFailed {
                reason: format!("content rule '{}' pattern is invalid: {}", rule.name, e),
            })?;
            content_rules.push(ContentRule {
                name: rule.name.clone(),
                regex,
                marker: rule.marker.clone(),
            });
        }

        // Idempotence guard: no pattern may match any marker, its own or
        // another rule's, or the field marker. Otherwise a second redaction
        // pass would rewrite the output of the first.
        for rule in &content_rules {
            let mut markers: Vec<&str> =
                content_rules.iter().map(|r| r.marker.as_str()).collect();
            markers.push(REDACTED_MARKER);
            for marker in markers {
                if rule.regex.is_match(marker) {
                    return Err(CustodiaError::RedactionFailed {
                        reason: format!(
                            "content rule '{}' matches marker '{}'; redaction would not be idempotent",
                            rule.name, marker
                        ),
                    });
                }
            }
        }

        Ok(Self {
            field_patterns,
            content_rules,
        })
    }

    /// Parse `s` as a TOML ruleset and compile it.
    pub fn from_toml_str(s: &str) -> CustodiaResult<Self> {
        let config: RulesetConfig = toml::from_str(s).map_err(|e| CustodiaError::ConfigError {
            reason: format!("failed to parse redaction ruleset TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as a TOML ruleset.
    pub fn from_file(path: &Path) -> CustodiaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CustodiaError::ConfigError {
            reason: format!(
                "failed to read redaction ruleset '{}': {}",
                path.display(),
                e
            ),
        })?;
        Self::from_toml_str(&contents)
    }

    /// True when `key` matches any field pattern (case-insensitive
    /// substring).
    pub fn field_matches(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.field_patterns.iter().any(|p| key.contains(p))
    }

    /// The compiled content rules, in application order.
    pub fn content_rules(&self) -> &[ContentRule] {
        &self.content_rules
    }
}

impl Default for RedactionRuleset {
    fn default() -> Self {
        Self::builtin()
    }
}
