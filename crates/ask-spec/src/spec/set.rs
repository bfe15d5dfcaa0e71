use serde_json::Value;

use crate::answers::Answer;
use crate::error::AskError;
use crate::spec::question::{DefaultValue, QuestionSpec};

/// Ordered collection of questions; keys are unique and order is asking order.
#[derive(Debug, Clone, Default)]
pub struct QuestionSet {
    entries: Vec<(String, QuestionSpec)>,
}

impl QuestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a JSON object, keeping document order.
    ///
    /// Entries that are plain literals become free-text questions defaulting
    /// to that literal.
    pub fn from_value(value: &Value) -> Result<Self, AskError> {
        let map = value.as_object().ok_or_else(|| {
            AskError::InvalidOptions("question set must be a JSON object".into())
        })?;

        let mut set = Self::new();
        for (key, entry) in map {
            let spec = match entry {
                Value::Object(_) => serde_json::from_value::<QuestionSpec>(entry.clone())
                    .map_err(|err| {
                        AskError::InvalidOptions(format!("question '{}': {}", key, err))
                    })?,
                other => {
                    let literal = Answer::from_json(other).ok_or_else(|| {
                        AskError::InvalidOptions(format!(
                            "question '{}' must be an object or a literal default",
                            key
                        ))
                    })?;
                    QuestionSpec {
                        default: Some(DefaultValue::Literal(literal)),
                        ..QuestionSpec::default()
                    }
                }
            };
            set.push(key.clone(), spec)?;
        }
        Ok(set)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AskError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| AskError::InvalidOptions(format!("question set is not JSON: {}", err)))?;
        Self::from_value(&value)
    }

    /// Appends a question. Keys must be unique.
    pub fn push(&mut self, key: impl Into<String>, spec: QuestionSpec) -> Result<(), AskError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(AskError::InvalidOptions(format!(
                "question '{}' is defined twice",
                key
            )));
        }
        self.entries.push((key, spec));
        Ok(())
    }

    /// Builder form of [`QuestionSet::push`].
    pub fn with(mut self, key: impl Into<String>, spec: QuestionSpec) -> Result<Self, AskError> {
        self.push(key, spec)?;
        Ok(self)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn get(&self, index: usize) -> Option<(&str, &QuestionSpec)> {
        self.entries
            .get(index)
            .map(|(key, spec)| (key.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuestionSpec)> {
        self.entries.iter().map(|(key, spec)| (key.as_str(), spec))
    }
}
