use std::io::Write;

use serde_json::Value;

use crate::answers::{Answer, AnswerMap};
use crate::error::AskError;
use crate::sequencer::Sequencer;
use crate::source::{LineSource, Session};
use crate::spec::question::QuestionSpec;
use crate::spec::set::QuestionSet;

/// Key used by [`confirm`] for its single question.
pub const CONFIRM_KEY: &str = "reply";

/// Asks every question in order and returns the collected answers.
///
/// The session's source is resumed if already open, otherwise opened for this
/// batch and closed again once the batch completes. Cancellation closes it.
pub fn ask<S, W>(
    questions: &QuestionSet,
    session: &mut Session<S>,
    out: &mut W,
) -> Result<AnswerMap, AskError>
where
    S: LineSource,
    W: Write,
{
    let mask = session.mask();
    let (source, created) = session.acquire()?;
    let outcome = Sequencer::new(questions, source, out)
        .with_mask(mask)
        .run();
    session.release(created, outcome.is_ok());
    outcome
}

/// Like [`ask`], for a question set given as JSON. Anything but an object is
/// rejected before the source is touched.
pub fn ask_value<S, W>(
    questions: &Value,
    session: &mut Session<S>,
    out: &mut W,
) -> Result<AnswerMap, AskError>
where
    S: LineSource,
    W: Write,
{
    let questions = QuestionSet::from_value(questions)?;
    ask(&questions, session, out)
}

/// Callback form of [`ask_value`]. Without a callback nothing is asked.
pub fn ask_then<S, W, F>(
    questions: &Value,
    session: &mut Session<S>,
    out: &mut W,
    callback: Option<F>,
) where
    S: LineSource,
    W: Write,
    F: FnOnce(Result<AnswerMap, AskError>),
{
    let Some(callback) = callback else {
        return;
    };
    callback(ask_value(questions, session, out));
}

/// Asks a single yes/no question, defaulting to yes.
pub fn confirm<S, W>(
    message: &str,
    session: &mut Session<S>,
    out: &mut W,
) -> Result<bool, AskError>
where
    S: LineSource,
    W: Write,
{
    let questions = QuestionSet::new().with(
        CONFIRM_KEY,
        QuestionSpec::confirm()
            .with_message(message)
            .with_default("yes"),
    )?;
    let answers = ask(&questions, session, out)?;
    Ok(match answers.get(CONFIRM_KEY) {
        Some(Answer::Bool(flag)) => *flag,
        Some(Answer::Text(text)) => text == "yes",
        _ => false,
    })
}
