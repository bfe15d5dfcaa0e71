#![allow(missing_docs)]

pub mod answers;
pub mod ask;
pub mod condition;
pub mod error;
pub mod interpret;
pub mod mask;
pub mod render;
pub mod sequencer;
pub mod source;
pub mod spec;
pub mod validate;

pub use answers::{Answer, AnswerMap, ExpectedType};
pub use ask::{CONFIRM_KEY, ask, ask_then, ask_value, confirm};
pub use condition::{Condition, dependencies_met};
pub use error::AskError;
pub use interpret::interpret;
pub use mask::{Capture, PasswordCapture};
pub use render::{PromptView, build_prompt, render_error, render_message};
pub use sequencer::Sequencer;
pub use source::{DEFAULT_MASK, Key, LineSource, Scripted, ScriptedSource, Session, SourceLog};
pub use spec::{DefaultValue, Pattern, QuestionKind, QuestionSet, QuestionSpec};
pub use validate::{ValidationError, error_message, validate};

/// JSON Schema describing a single question-set entry.
pub fn question_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(QuestionSpec)).unwrap_or_default()
}
