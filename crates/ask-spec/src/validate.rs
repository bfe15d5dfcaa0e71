use crate::answers::Answer;
use crate::spec::question::{QuestionKind, QuestionSpec};

const DEFAULT_ERROR: &str = "Invalid value.";

/// Why a reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub code: &'static str,
}

/// Checks an interpreted reply against the question's constraints.
///
/// `fallback` is the default resolved for this prompt; a blank reply is
/// accepted when it exists or the question allows empty answers.
pub fn validate(
    spec: &QuestionSpec,
    answer: Option<&Answer>,
    fallback: Option<&Answer>,
) -> Result<(), ValidationError> {
    let Some(answer) = answer else {
        if spec.allow_empty || fallback.is_some() {
            return Ok(());
        }
        return Err(rejection(spec, "empty"));
    };

    if let Some(pattern) = &spec.regex {
        return if pattern.is_match(&answer.to_string()) {
            Ok(())
        } else {
            Err(rejection(spec, "pattern_mismatch"))
        };
    }

    if let Some(options) = &spec.options {
        return if options.contains(answer) {
            Ok(())
        } else {
            Err(rejection(spec, "option_mismatch"))
        };
    }

    if matches!(spec.kind, QuestionKind::Confirm) {
        return if answer.as_bool().is_some() {
            Ok(())
        } else {
            Err(rejection(spec, "type_mismatch"))
        };
    }

    if let Some(expected) = spec.kind.expected_type()
        && answer.expected_type() != expected
    {
        return Err(rejection(spec, "type_mismatch"));
    }

    Ok(())
}

/// Message printed when a reply is rejected: the custom error, or the stock
/// text, followed by the option list when there is one.
pub fn error_message(spec: &QuestionSpec) -> String {
    let mut message = spec.error.clone().unwrap_or_else(|| DEFAULT_ERROR.into());
    if let Some(options) = spec.options_label() {
        message.push_str(&format!(" (options are {})", options));
    }
    message
}

fn rejection(spec: &QuestionSpec, code: &'static str) -> ValidationError {
    ValidationError {
        message: error_message(spec),
        code,
    }
}
