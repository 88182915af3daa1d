//! The open-but-closed `details` payload type.
//!
//! Callers attach arbitrary supplementary fields to a record. Rather than
//! carrying a fully dynamic JSON value, `DetailValue` is a closed variant
//! set so the redactor and the canonical serializer have an exhaustive set
//! of cases to handle. Maps are `BTreeMap`s: key order is sorted, which is
//! one of the three pillars of canonical serialization (the others being
//! struct declaration order and the pinned timestamp format).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Marker written in place of redacted values.
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Nesting depth past which foreign JSON is coarsened instead of converted.
const MAX_DEPTH: usize = 32;

/// A single value inside a `Details` payload.
///
/// Serialized untagged, so the on-disk form reads as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<DetailValue>),
    Map(BTreeMap<String, DetailValue>),
}

impl From<bool> for DetailValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for DetailValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// The supplementary-field mapping attached to every record.
///
/// Always passed through the redactor before it reaches an appender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Details(BTreeMap<String, DetailValue>);

impl Details {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// ```rust,ignore
    /// let details = Details::new()
    ///     .with("resource", "encounter")
    ///     .with("duration_ms", 42i64);
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a pre-built value.
    pub fn insert(&mut self, key: impl Into<String>, value: DetailValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DetailValue)> {
        self.0.iter()
    }

    /// A payload collapsed to a single redaction marker.
    ///
    /// This is the coarse fallback: when an input cannot be classified it
    /// is treated as wholly sensitive rather than risking a leak.
    pub fn coarse() -> Self {
        Self::new().with("payload", REDACTED_MARKER)
    }

    /// Lossy, never-failing conversion from foreign JSON.
    ///
    /// Shapes the closed type cannot represent are coerced to strings so
    /// they still pass through content-pattern redaction. Subtrees nested
    /// deeper than an internal limit are coarsened to the redaction
    /// marker instead of converted — treat-as-sensitive, never error.
    ///
    /// A non-object top-level value becomes a single `payload` entry.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self(
                map.iter()
                    .map(|(k, v)| (k.clone(), detail_from_json(v, 0)))
                    .collect(),
            ),
            other => Self::new().with_value("payload", detail_from_json(other, 0)),
        }
    }

    fn with_value(mut self, key: &str, value: DetailValue) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }
}

impl FromIterator<(String, DetailValue)> for Details {
    fn from_iter<I: IntoIterator<Item = (String, DetailValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Details {
    type Item = (String, DetailValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, DetailValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn detail_from_json(value: &serde_json::Value, depth: usize) -> DetailValue {
    if depth > MAX_DEPTH {
        return DetailValue::Str(REDACTED_MARKER.to_string());
    }
    match value {
        serde_json::Value::Null => DetailValue::Null,
        serde_json::Value::Bool(b) => DetailValue::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DetailValue::Int(i)
            } else if n.is_u64() {
                // u64 beyond i64 range: coerce to string rather than lose
                // precision through f64.
                DetailValue::Str(n.to_string())
            } else if let Some(f) = n.as_f64() {
                DetailValue::Float(f)
            } else {
                DetailValue::Str(n.to_string())
            }
        }
        serde_json::Value::String(s) => DetailValue::Str(s.clone()),
        serde_json::Value::Array(items) => DetailValue::List(
            items.iter().map(|v| detail_from_json(v, depth + 1)).collect(),
        ),
        serde_json::Value::Object(map) => DetailValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), detail_from_json(v, depth + 1)))
                .collect(),
        ),
    }
}
