use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::answers::{Answer, AnswerMap, ExpectedType};
use crate::condition::Condition;

/// Supported question kinds. A missing `type` means free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    Text,
    Confirm,
    Password,
    Boolean,
    Number,
    String,
}

impl QuestionKind {
    /// Declared value type, for kinds that constrain it by name.
    pub fn expected_type(&self) -> Option<ExpectedType> {
        match self {
            QuestionKind::Boolean => Some(ExpectedType::Boolean),
            QuestionKind::Number => Some(ExpectedType::Number),
            QuestionKind::String => Some(ExpectedType::String),
            QuestionKind::Text | QuestionKind::Confirm | QuestionKind::Password => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Confirm => "confirm",
            QuestionKind::Password => "password",
            QuestionKind::Boolean => "boolean",
            QuestionKind::Number => "number",
            QuestionKind::String => "string",
        }
    }
}

type ComputeDefault = dyn Fn(&AnswerMap) -> Option<Answer> + Send + Sync;

/// Default for a question: a literal, or a function of the answers so far.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Answer),
    Computed(Arc<ComputeDefault>),
}

impl DefaultValue {
    pub fn computed<F>(compute: F) -> Self
    where
        F: Fn(&AnswerMap) -> Option<Answer> + Send + Sync + 'static,
    {
        DefaultValue::Computed(Arc::new(compute))
    }

    pub fn resolve(&self, answers: &AnswerMap) -> Option<Answer> {
        match self {
            DefaultValue::Literal(value) => Some(value.clone()),
            DefaultValue::Computed(compute) => compute(answers),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Answer::deserialize(deserializer).map(DefaultValue::Literal)
    }
}

/// Compiled reply pattern. Matching is unanchored.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// A single entry of a question set.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct QuestionSpec {
    /// Text shown in bold above the prompt.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    #[schemars(with = "Option<Answer>")]
    pub default: Option<DefaultValue>,
    /// Accepted values; replies must equal one of them exactly.
    #[serde(default)]
    pub options: Option<Vec<Answer>>,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub regex: Option<Pattern>,
    #[serde(default)]
    pub allow_empty: bool,
    /// Replaces the stock `Invalid value.` message.
    #[serde(default)]
    pub error: Option<String>,
    /// Conditions on earlier answers; all must hold for the question to be asked.
    #[serde(default)]
    #[schemars(with = "BTreeMap<String, Value>")]
    pub depends_on: BTreeMap<String, Condition>,
}

impl QuestionSpec {
    pub fn text() -> Self {
        Self::default()
    }

    pub fn confirm() -> Self {
        Self::of_kind(QuestionKind::Confirm)
    }

    pub fn password() -> Self {
        Self::of_kind(QuestionKind::Password)
    }

    pub fn of_kind(kind: QuestionKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Answer>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn with_computed_default<F>(mut self, compute: F) -> Self
    where
        F: Fn(&AnswerMap) -> Option<Answer> + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::computed(compute));
        self
    }

    pub fn with_options<I, A>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Answer>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_regex(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.regex = Some(Pattern::new(pattern)?);
        Ok(self)
    }

    pub fn allowing_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn depends_on(mut self, key: impl Into<String>, condition: Condition) -> Self {
        self.depends_on.insert(key.into(), condition);
        self
    }

    /// Resolves the default against the answers recorded so far.
    pub fn resolve_default(&self, answers: &AnswerMap) -> Option<Answer> {
        self.default
            .as_ref()
            .and_then(|default| default.resolve(answers))
    }

    /// Options rendered for display, e.g. `red, blue`.
    pub fn options_label(&self) -> Option<String> {
        self.options.as_ref().map(|options| {
            options
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}
