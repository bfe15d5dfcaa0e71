use std::fmt::Write;

use ask_spec::{Answer, AnswerMap, AskError, Condition, DefaultValue, QuestionSet, QuestionSpec};
use clap::ValueEnum;

/// Encoding used when printing collected answers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    /// CBOR, printed as lowercase hex.
    Cbor,
}

/// Prints what a run produced once the sequencer hands control back.
pub struct AnswerPresenter {
    format: OutputFormat,
}

impl AnswerPresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn show_answers(&self, answers: &AnswerMap) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Json => println!("{}", answers.to_json_pretty()?),
            OutputFormat::Cbor => println!("{}", encode_hex(&answers.to_cbor()?)),
        }
        Ok(())
    }

    /// Reports a run that ended early, with whatever was answered before.
    pub fn show_failure(&self, error: &AskError) {
        eprintln!("{}", error);
        if let Some(partial) = error.partial_answers() {
            match partial.to_json_pretty() {
                Ok(pretty) => eprintln!("Partial answers: {}", pretty),
                Err(err) => eprintln!("Failed to serialize partial answers: {}", err),
            }
        }
    }

    pub fn show_question_set(&self, questions: &QuestionSet) {
        println!("{} questions", questions.len());
        for (key, spec) in questions.iter() {
            println!("{}", describe_question(key, spec));
        }
    }
}

pub fn describe_question(key: &str, spec: &QuestionSpec) -> String {
    let mut line = format!("{} ({})", key, spec.kind.as_str());
    if let Some(DefaultValue::Literal(value)) = &spec.default {
        let _ = write!(line, " default: {}", value);
    }
    if let Some(options) = spec.options_label() {
        let _ = write!(line, " options: {}", options);
    }
    if spec.allow_empty {
        line.push_str(" optional");
    }
    if !spec.depends_on.is_empty() {
        let conditions = spec
            .depends_on
            .iter()
            .map(|(dep, condition)| describe_condition(dep, condition))
            .collect::<Vec<_>>();
        let _ = write!(line, " when {}", conditions.join(" and "));
    }
    line
}

fn describe_condition(dep: &str, condition: &Condition) -> String {
    match condition {
        Condition::Equals(value) => format!("{} = {}", dep, value),
        Condition::Not(value) => format!("{} != {}", dep, value),
        Condition::In(values) => format!("{} in [{}]", dep, join_answers(values)),
    }
}

fn join_answers(values: &[Answer]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(encoded, "{:02x}", byte);
    }
    encoded
}
