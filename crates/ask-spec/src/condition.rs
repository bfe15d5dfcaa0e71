use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::answers::{Answer, AnswerMap};

/// Requirement on one earlier answer, used by `depends_on`.
///
/// In JSON a bare literal means [`Condition::Equals`], `{"not": literal}` means
/// [`Condition::Not`] and `{"in": [..]}` means [`Condition::In`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Answer),
    Not(Answer),
    In(Vec<Answer>),
}

impl Condition {
    pub fn equals(value: impl Into<Answer>) -> Self {
        Condition::Equals(value.into())
    }

    pub fn not(value: impl Into<Answer>) -> Self {
        Condition::Not(value.into())
    }

    pub fn one_of<I, A>(values: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Answer>,
    {
        Condition::In(values.into_iter().map(Into::into).collect())
    }

    /// Checks the condition against the answer recorded for its key.
    /// An absent answer only satisfies [`Condition::Not`].
    pub fn holds(&self, answer: Option<&Answer>) -> bool {
        match self {
            Condition::Equals(expected) => answer == Some(expected),
            Condition::Not(rejected) => answer != Some(rejected),
            Condition::In(allowed) => answer.is_some_and(|value| allowed.contains(value)),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, String> {
        if let Value::Object(map) = value {
            if let Some(rejected) = map.get("not") {
                return literal(rejected).map(Condition::Not);
            }
            if let Some(allowed) = map.get("in") {
                let items = allowed
                    .as_array()
                    .ok_or_else(|| "`in` condition expects an array".to_string())?;
                return items
                    .iter()
                    .map(literal)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Condition::In);
            }
            return Err("condition object needs a `not` or `in` entry".into());
        }
        literal(value).map(Condition::Equals)
    }
}

fn literal(value: &Value) -> Result<Answer, String> {
    Answer::from_json(value).ok_or_else(|| format!("unsupported condition value {}", value))
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Condition::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// True when every condition holds against `answers`.
pub fn dependencies_met(conditions: &BTreeMap<String, Condition>, answers: &AnswerMap) -> bool {
    conditions
        .iter()
        .all(|(key, condition)| condition.holds(answers.get(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers() -> AnswerMap {
        let mut answers = AnswerMap::new();
        answers.record("db", Some("postgres".into()));
        answers.record("ssl", Some(true.into()));
        answers.record("skipped", None);
        answers
    }

    #[test]
    fn parses_the_three_shapes() {
        assert_eq!(
            Condition::from_json(&json!("postgres")).unwrap(),
            Condition::equals("postgres")
        );
        assert_eq!(
            Condition::from_json(&json!({ "not": false })).unwrap(),
            Condition::not(false)
        );
        assert_eq!(
            Condition::from_json(&json!({ "in": ["a", 1] })).unwrap(),
            Condition::In(vec![Answer::text("a"), Answer::Number(1.0)])
        );
        assert!(Condition::from_json(&json!({ "other": 1 })).is_err());
        assert!(Condition::from_json(&json!({ "in": "a" })).is_err());
    }

    #[test]
    fn all_conditions_must_hold() {
        let answers = answers();
        let mut conditions = BTreeMap::new();
        conditions.insert("db".to_string(), Condition::one_of(["postgres", "mysql"]));
        conditions.insert("ssl".to_string(), Condition::equals(true));
        assert!(dependencies_met(&conditions, &answers));

        conditions.insert("ssl".to_string(), Condition::not(true));
        assert!(!dependencies_met(&conditions, &answers));
    }

    #[test]
    fn absent_answers_only_satisfy_negation() {
        let answers = answers();
        assert!(Condition::not("x").holds(answers.get("skipped")));
        assert!(!Condition::equals("x").holds(answers.get("skipped")));
        assert!(!Condition::one_of(["x"]).holds(answers.get("missing")));
    }

    #[test]
    fn equality_is_strict_about_types() {
        let mut answers = AnswerMap::new();
        answers.record("port", Some(Answer::Number(80.0)));
        assert!(!Condition::equals("80").holds(answers.get("port")));
        assert!(Condition::equals(80).holds(answers.get("port")));
    }
}
