use owo_colors::OwoColorize;

use crate::answers::Answer;
use crate::spec::question::{QuestionKind, QuestionSpec};

/// Everything printed for one question before its reply is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptView {
    /// Inline prompt, e.g. ` - color: [red] `.
    pub prompt: String,
    /// Bold header line: trimmed message plus options, when either exists.
    pub message: Option<String>,
    /// Reply is read keystroke by keystroke and echoed as mask glyphs.
    pub masked: bool,
}

/// Builds the prompt for `key`. `fallback` is the resolved default.
pub fn build_prompt(key: &str, spec: &QuestionSpec, fallback: Option<&Answer>) -> PromptView {
    let mut prompt = if matches!(spec.kind, QuestionKind::Confirm) {
        " - yes/no: ".to_string()
    } else {
        format!(" - {}: ", key)
    };

    if let Some(value) = fallback.filter(|value| !value.is_empty_text()) {
        prompt.push_str(&format!("[{}] ", value));
    }

    PromptView {
        prompt,
        message: message_line(spec),
        masked: matches!(spec.kind, QuestionKind::Password),
    }
}

fn message_line(spec: &QuestionSpec) -> Option<String> {
    let mut line = String::new();
    if let Some(text) = &spec.message {
        line.push_str(text.trim());
        line.push(' ');
    }
    if let Some(options) = spec.options_label() {
        line.push_str(&format!("(options are {})", options));
    }
    if line.is_empty() { None } else { Some(line) }
}

/// Bold message line, newline terminated.
pub fn render_message(message: &str) -> String {
    format!("{}\n", message.bold())
}

/// Red error line, newline terminated.
pub fn render_error(message: &str) -> String {
    format!("{}\n", message.red())
}
