pub mod question;
pub mod set;

pub use question::{DefaultValue, Pattern, QuestionKind, QuestionSpec};
pub use set::QuestionSet;
