use std::fmt;

use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Largest magnitude at which every whole `f64` is an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Type tag of an [`Answer`], used for declared-type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedType {
    Boolean,
    Number,
    String,
}

impl ExpectedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedType::Boolean => "boolean",
            ExpectedType::Number => "number",
            ExpectedType::String => "string",
        }
    }
}

/// A typed reply value.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text(value.into())
    }

    pub fn expected_type(&self) -> ExpectedType {
        match self {
            Answer::Bool(_) => ExpectedType::Boolean,
            Answer::Number(_) => ExpectedType::Number,
            Answer::Text(_) => ExpectedType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Answer::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            _ => None,
        }
    }

    /// True for the empty string, which is never shown as a default hint.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Answer::Text(text) if text.is_empty())
    }

    /// Converts a JSON literal; arrays, objects and `null` have no answer form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Answer::Bool(*flag)),
            Value::Number(num) => num.as_f64().map(Answer::Number),
            Value::String(text) => Some(Answer::Text(text.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Answer::Bool(flag) => Value::Bool(*flag),
            Answer::Number(value) => match whole_number(*value) {
                Some(int) => Value::Number(Number::from(int)),
                None => Number::from_f64(*value)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            },
            Answer::Text(text) => Value::String(text.clone()),
        }
    }
}

fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Some(value as i64)
    } else {
        None
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Bool(flag) => write!(f, "{}", flag),
            Answer::Number(value) => write!(f, "{}", value),
            Answer::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Answer::Bool(flag) => serializer.serialize_bool(*flag),
            Answer::Number(value) => match whole_number(*value) {
                Some(int) => serializer.serialize_i64(int),
                None => serializer.serialize_f64(*value),
            },
            Answer::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Answer::Bool(value)
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Answer::Number(value)
    }
}

impl From<i32> for Answer {
    fn from(value: i32) -> Self {
        Answer::Number(f64::from(value))
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Answer::Text(value)
    }
}

/// Answers collected during one run, in the order they were recorded.
///
/// `None` marks a key that was recorded without a value (skipped by a
/// dependency, or left empty where that is allowed). Entries are append-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerMap {
    entries: Vec<(String, Option<Answer>)>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `key`. Returns `false` and leaves the map
    /// untouched when the key was already recorded.
    pub fn record(&mut self, key: impl Into<String>, value: Option<Answer>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    /// The answer stored for `key`, if the key was recorded with a value.
    pub fn get(&self, key: &str) -> Option<&Answer> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(entry_key, _)| entry_key == key)
    }

    /// Number of recorded keys, counting skipped ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Answer>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    /// JSON object view; unanswered keys map to `null`.
    pub fn to_json(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(key, value)| {
                (
                    key.clone(),
                    value.as_ref().map(Answer::to_json).unwrap_or(Value::Null),
                )
            })
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }
}

impl Serialize for AnswerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_numbers_serialize_as_integers() {
        assert_eq!(serde_json::to_value(Answer::Number(42.0)).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(Answer::Number(1.5)).unwrap(), json!(1.5));
    }

    #[test]
    fn record_never_overwrites() {
        let mut answers = AnswerMap::new();
        assert!(answers.record("name", Some("alpha".into())));
        assert!(!answers.record("name", Some("beta".into())));
        assert_eq!(answers.get("name"), Some(&Answer::text("alpha")));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn skipped_keys_count_and_render_as_null() {
        let mut answers = AnswerMap::new();
        answers.record("first", Some(Answer::Bool(true)));
        answers.record("second", None);
        assert_eq!(answers.len(), 2);
        assert_eq!(answers.get("second"), None);
        assert_eq!(answers.to_json(), json!({ "first": true, "second": null }));
    }

    #[test]
    fn json_view_keeps_record_order() {
        let mut answers = AnswerMap::new();
        answers.record("zeta", Some(1.into()));
        answers.record("alpha", Some(2.into()));
        let keys = answers
            .to_json()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
