//! Read-only access to untyped input trees.
//!
//! The builder never matches on a concrete parse-tree representation. It
//! only uses the operations of [`ValueAccessor`], which is implemented here
//! for `serde_json::Value` (JSON and YAML inputs both parse into it).

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dynamic kind of a generic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Mapping,
    Sequence,
    String,
    Number,
    Boolean,
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Mapping => "mapping",
            ValueKind::Sequence => "sequence",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// Query capabilities over a mapping/sequence/scalar tree.
pub trait ValueAccessor {
    fn kind(&self) -> ValueKind;

    /// Keyed lookup; `None` for missing keys and non-mappings.
    fn value_for_key(&self, key: &str) -> Option<&Self>;

    /// Mapping entries in source order; `None` for non-mappings.
    fn entries(&self) -> Option<Vec<(&str, &Self)>>;

    /// Sequence elements; `None` for non-sequences.
    fn elements(&self) -> Option<Vec<&Self>>;

    fn as_str(&self) -> Option<&str>;

    fn as_f64(&self) -> Option<f64>;

    fn as_i64(&self) -> Option<i64>;

    fn as_bool(&self) -> Option<bool>;

    /// Canonical single-line text rendering of the value.
    fn render(&self) -> String;

    fn has_key(&self, key: &str) -> bool {
        self.value_for_key(key).is_some()
    }

    /// Required keys absent from the mapping, in iteration order.
    fn missing_keys<'k, I>(&self, required: I) -> Vec<&'k str>
    where
        I: IntoIterator<Item = &'k str>,
        Self: Sized,
    {
        required
            .into_iter()
            .filter(|key| !self.has_key(key))
            .collect()
    }

    fn contains_all_keys<'k, I>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = &'k str>,
        Self: Sized,
    {
        self.missing_keys(required).is_empty()
    }

    /// Keys that are neither allowed by name nor matched by a pattern.
    fn unexpected_keys(&self, allowed: &BTreeSet<String>, patterns: &[Regex]) -> Vec<&str> {
        self.entries()
            .unwrap_or_default()
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| {
                !allowed.contains(*key) && !patterns.iter().any(|p| pattern_matches(p, key))
            })
            .collect()
    }

    fn contains_only_keys_and_patterns(
        &self,
        allowed: &BTreeSet<String>,
        patterns: &[Regex],
    ) -> bool {
        self.unexpected_keys(allowed, patterns).is_empty()
    }

    /// Converts a sequence to strings, reporting the kind of each
    /// non-string element in place.
    fn to_string_sequence(&self) -> Option<Vec<Result<String, ValueKind>>> {
        self.elements().map(|elements| {
            elements
                .into_iter()
                .map(|element| element.as_str().map(str::to_string).ok_or(element.kind()))
                .collect()
        })
    }
}

/// Regex search over a key; anchors are carried by the pattern itself.
pub fn pattern_matches(pattern: &Regex, key: &str) -> bool {
    pattern.is_match(key)
}

impl ValueAccessor for Value {
    fn kind(&self) -> ValueKind {
        match self {
            Value::Object(_) => ValueKind::Mapping,
            Value::Array(_) => ValueKind::Sequence,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
        }
    }

    fn value_for_key(&self, key: &str) -> Option<&Self> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn entries(&self) -> Option<Vec<(&str, &Self)>> {
        self.as_object()
            .map(|map| map.iter().map(|(key, value)| (key.as_str(), value)).collect())
    }

    fn elements(&self) -> Option<Vec<&Self>> {
        self.as_array().map(|items| items.iter().collect())
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }

    fn as_f64(&self) -> Option<f64> {
        Value::as_f64(self)
    }

    fn as_i64(&self) -> Option<i64> {
        Value::as_i64(self)
    }

    fn as_bool(&self) -> Option<bool> {
        Value::as_bool(self)
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_missing_and_unexpected_keys() {
        let value = json!({"title": "T", "x-logo": "l", "extra": 1});

        assert_eq!(value.missing_keys(["title", "version"]), vec!["version"]);
        assert!(!value.contains_all_keys(["title", "version"]));

        let allowed: BTreeSet<String> = ["title".to_string()].into_iter().collect();
        let patterns = vec![Regex::new("^x-").unwrap()];
        assert_eq!(value.unexpected_keys(&allowed, &patterns), vec!["extra"]);
    }

    #[test]
    fn string_sequence_flags_each_bad_element() {
        let value = json!(["a", 1, "b", null]);
        let converted = value.to_string_sequence().expect("sequence");
        assert_eq!(
            converted,
            vec![
                Ok("a".to_string()),
                Err(ValueKind::Number),
                Ok("b".to_string()),
                Err(ValueKind::Null),
            ]
        );
        assert!(json!("a").to_string_sequence().is_none());
    }

    #[test]
    fn entries_keep_source_order() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        let keys: Vec<&str> = value
            .entries()
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
