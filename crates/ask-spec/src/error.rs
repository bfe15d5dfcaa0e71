use thiserror::Error;

use crate::answers::AnswerMap;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// The line source closed before every question was recorded.
    #[error("Cancelled after giving {answered} answers.")]
    Cancelled { answered: usize, answers: AnswerMap },
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl AskError {
    /// Answers recorded before cancellation, if any.
    pub fn partial_answers(&self) -> Option<&AnswerMap> {
        match self {
            AskError::Cancelled { answers, .. } => Some(answers),
            _ => None,
        }
    }
}
