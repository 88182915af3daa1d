//! The PHI redaction engine.
//!
//! `PhiRedactor` applies a `RedactionRuleset` to a `Details` payload:
//! field rules first (a matching key's value is replaced outright), then
//! content rules on every surviving string, recursing through nested maps
//! and lists. Non-string leaves pass through unchanged.
//!
//! Redaction is pure, deterministic for a given ruleset, and idempotent —
//! the ruleset compiler rejects any pattern that could match a marker.

use custodia_contracts::{DetailValue, Details, REDACTED_MARKER};
use custodia_core::Redactor;

use crate::ruleset::RedactionRuleset;

/// A `Redactor` backed by a compiled ruleset.
#[derive(Debug, Clone, Default)]
pub struct PhiRedactor {
    ruleset: RedactionRuleset,
}

impl PhiRedactor {
    pub fn new(ruleset: RedactionRuleset) -> Self {
        Self { ruleset }
    }

    /// An engine with the built-in PHI ruleset.
    pub fn builtin() -> Self {
        Self::new(RedactionRuleset::builtin())
    }

    fn redact_value(&self, value: &DetailValue) -> DetailValue {
        match value {
            DetailValue::Str(s) => DetailValue::Str(self.redact_string(s)),
            DetailValue::List(items) => {
                DetailValue::List(items.iter().map(|v| self.redact_value(v)).collect())
            }
            DetailValue::Map(map) => DetailValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.redact_entry(k, v)))
                    .collect(),
            ),
            // Null / Bool / Int / Float carry no free-text PHI.
            other => other.clone(),
        }
    }

    fn redact_entry(&self, key: &str, value: &DetailValue) -> DetailValue {
        if self.ruleset.field_matches(key) {
            return DetailValue::Str(REDACTED_MARKER.to_string());
        }
        self.redact_value(value)
    }

    /// Apply every content rule, in ruleset order, replacing all matches.
    fn redact_string(&self, s: &str) -> String {
        let mut out = s.to_string();
        for rule in self.ruleset.content_rules() {
            if rule.regex.is_match(&out) {
                out = rule.regex.replace_all(&out, rule.marker.as_str()).into_owned();
            }
        }
        out
    }
}

impl Redactor for PhiRedactor {
    fn redact(&self, details: &Details) -> Details {
        details
            .iter()
            .map(|(k, v)| (k.clone(), self.redact_entry(k, v)))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use custodia_contracts::{DetailValue, Details};
    use custodia_core::Redactor;

    use super::PhiRedactor;
    use crate::ruleset::{RedactionRuleset, BUILTIN_FIELD_PATTERNS};

    fn redactor() -> PhiRedactor {
        PhiRedactor::builtin()
    }

    fn str_value(details: &Details, key: &str) -> String {
        match details.get(key) {
            Some(DetailValue::Str(s)) => s.clone(),
            other => panic!("expected string at '{}', got {:?}", key, other),
        }
    }

    // ── Field rules ───────────────────────────────────────────────────────────

    /// The reference scenario: a PHI field name plus a phone-shaped
    /// substring in a free-text note.
    #[test]
    fn redacts_name_field_and_phone_content() {
        let input = Details::new()
            .with("patient_name", "Jane Doe")
            .with("note", "call 555-123-4567");

        let out = redactor().redact(&input);

        assert_eq!(str_value(&out, "patient_name"), "[REDACTED]");
        assert_eq!(str_value(&out, "note"), "call [PHONE-REDACTED]");
    }

    /// Field matching is a case-insensitive substring check.
    #[test]
    fn field_match_is_case_insensitive_substring() {
        let input = Details::new()
            .with("PatientName", "Jane Doe")
            .with("home_phone", "x")
            .with("note", "nothing sensitive");

        let out = redactor().redact(&input);

        assert_eq!(str_value(&out, "PatientName"), "[REDACTED]");
        assert_eq!(str_value(&out, "home_phone"), "[REDACTED]");
        assert_eq!(str_value(&out, "note"), "nothing sensitive");
    }

    /// A matching key's value is replaced whatever its type.
    #[test]
    fn field_rule_replaces_non_string_values() {
        let input = Details::new().with("mrn", 123456i64);
        let out = redactor().redact(&input);
        assert_eq!(str_value(&out, "mrn"), "[REDACTED]");
    }

    /// Every built-in field pattern catches a payload keyed exactly by it,
    /// at the top level and nested two maps deep.
    #[test]
    fn field_redaction_is_complete_at_any_depth() {
        for pattern in BUILTIN_FIELD_PATTERNS {
            let nested = DetailValue::Map(
                [(
                    "inner".to_string(),
                    DetailValue::Map(
                        [(pattern.to_string(), DetailValue::Str("secret".into()))]
                            .into_iter()
                            .collect(),
                    ),
                )]
                .into_iter()
                .collect(),
            );
            let input = Details::new()
                .with(*pattern, "secret")
                .with("wrapper", nested);

            let out = redactor().redact(&input);

            assert_eq!(
                str_value(&out, *pattern),
                "[REDACTED]",
                "top-level '{}' must be redacted",
                pattern
            );
            match out.get("wrapper") {
                Some(DetailValue::Map(outer)) => match outer.get("inner") {
                    Some(DetailValue::Map(inner)) => {
                        assert_eq!(
                            inner.get(*pattern),
                            Some(&DetailValue::Str("[REDACTED]".into())),
                            "nested '{}' must be redacted",
                            pattern
                        );
                    }
                    other => panic!("expected inner map, got {:?}", other),
                },
                other => panic!("expected wrapper map, got {:?}", other),
            }
        }
    }

    // ── Content rules ─────────────────────────────────────────────────────────

    #[test]
    fn content_rules_each_fire() {
        let input = Details::new()
            .with("a", "ssn 123-45-6789 on file")
            .with("b", "fax to (555) 867-5309 today")
            .with("c", "sent to jane.doe@example.org")
            .with("d", "seen on 2024-03-14 and again 3/1/2024");

        let out = redactor().redact(&input);

        assert_eq!(str_value(&out, "a"), "ssn [SSN-REDACTED] on file");
        assert_eq!(str_value(&out, "b"), "fax to [PHONE-REDACTED] today");
        assert_eq!(str_value(&out, "c"), "sent to [EMAIL-REDACTED]");
        assert_eq!(
            str_value(&out, "d"),
            "seen on [DATE-REDACTED] and again [DATE-REDACTED]"
        );
    }

    /// Multiple matches within one string are all replaced.
    #[test]
    fn all_matches_in_one_string_are_replaced() {
        let input = Details::new().with("note", "primary 555-123-4567, backup 555-765-4321");
        let out = redactor().redact(&input);
        assert_eq!(
            str_value(&out, "note"),
            "primary [PHONE-REDACTED], backup [PHONE-REDACTED]"
        );
    }

    /// Strings inside lists are redacted too.
    #[test]
    fn content_rules_recurse_into_lists() {
        let input = Details::new().with(
            "contacts",
            DetailValue::List(vec![
                DetailValue::Str("555-123-4567".into()),
                DetailValue::Int(7),
            ]),
        );
        let out = redactor().redact(&input);
        match out.get("contacts") {
            Some(DetailValue::List(items)) => {
                assert_eq!(items[0], DetailValue::Str("[PHONE-REDACTED]".into()));
                assert_eq!(items[1], DetailValue::Int(7));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    /// Non-string, non-container leaves pass through untouched.
    #[test]
    fn scalar_leaves_pass_through() {
        let input = Details::new()
            .with("count", 3i64)
            .with("ratio", 0.25f64)
            .with("ok", true);
        let out = redactor().redact(&input);
        assert_eq!(out, input);
    }

    // ── Idempotence & determinism ─────────────────────────────────────────────

    /// redact(redact(x)) == redact(x) for a payload exercising every rule.
    #[test]
    fn redaction_is_idempotent() {
        let input = Details::new()
            .with("patient_name", "Jane Doe")
            .with("ssn", "123-45-6789")
            .with("note", "call 555-123-4567 or jane@example.org on 2024-03-14");

        let engine = redactor();
        let once = engine.redact(&input);
        let twice = engine.redact(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn redaction_is_deterministic() {
        let input = Details::new().with("note", "ssn 123-45-6789");
        let engine = redactor();
        assert_eq!(engine.redact(&input), engine.redact(&input));
    }

    // ── TOML rulesets ─────────────────────────────────────────────────────────

    #[test]
    fn toml_ruleset_parses_and_applies() {
        let ruleset = RedactionRuleset::from_toml_str(
            r#"
            field_patterns = ["badge"]

            [[content_rules]]
            name = "room"
            pattern = 'room \d+'
            marker = "[ROOM-REDACTED]"
            "#,
        )
        .unwrap();
        let engine = PhiRedactor::new(ruleset);

        let input = Details::new()
            .with("badge_number", "B-9")
            .with("note", "moved to room 12");
        let out = engine.redact(&input);

        assert_eq!(str_value(&out, "badge_number"), "[REDACTED]");
        assert_eq!(str_value(&out, "note"), "moved to [ROOM-REDACTED]");
    }

    #[test]
    fn invalid_regex_is_rejected_at_load() {
        let result = RedactionRuleset::from_toml_str(
            r#"
            [[content_rules]]
            name = "broken"
            pattern = '(['
            marker = "[X]"
            "#,
        );
        assert!(result.is_err());
    }

    /// A marker its own pattern would match breaks idempotence and must be
    /// rejected at load time.
    #[test]
    fn self_matching_marker_is_rejected() {
        let result = RedactionRuleset::from_toml_str(
            r#"
            [[content_rules]]
            name = "digits"
            pattern = '\d+'
            marker = "[GOT-4-DIGITS]"
            "#,
        );
        assert!(result.is_err());
    }
}
