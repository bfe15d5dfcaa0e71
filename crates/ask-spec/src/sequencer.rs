//! Question sequencing state machine.
//!
//! One question is in flight at a time. Each reply is interpreted and
//! validated; a rejected reply re-asks the same question, an accepted one is
//! recorded and the index advances. Questions whose `depends_on` conditions
//! fail are recorded as unanswered without prompting.

use std::io::Write;

use tracing::{debug, trace};

use crate::answers::{Answer, AnswerMap};
use crate::condition::dependencies_met;
use crate::error::AskError;
use crate::interpret::interpret;
use crate::mask::{Capture, PasswordCapture};
use crate::render::{PromptView, build_prompt, render_error, render_message};
use crate::source::{DEFAULT_MASK, LineSource};
use crate::spec::set::QuestionSet;
use crate::validate::validate;

enum State {
    AskNext(usize),
    WaitingForReply {
        index: usize,
        view: PromptView,
        fallback: Option<Answer>,
    },
    Validating {
        index: usize,
        reply: String,
        fallback: Option<Answer>,
    },
    Done,
    Cancelled,
}

pub struct Sequencer<'a, S, W> {
    questions: &'a QuestionSet,
    source: &'a mut S,
    out: &'a mut W,
    mask: char,
    answers: AnswerMap,
}

impl<'a, S: LineSource, W: Write> Sequencer<'a, S, W> {
    pub fn new(questions: &'a QuestionSet, source: &'a mut S, out: &'a mut W) -> Self {
        Self {
            questions,
            source,
            out,
            mask: DEFAULT_MASK,
            answers: AnswerMap::new(),
        }
    }

    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = mask;
        self
    }

    /// Runs until every question is recorded or the source closes.
    pub fn run(mut self) -> Result<AnswerMap, AskError> {
        let mut state = State::AskNext(0);
        loop {
            state = match state {
                State::AskNext(index) => self.ask_next(index)?,
                State::WaitingForReply {
                    index,
                    view,
                    fallback,
                } => self.wait_for_reply(index, &view, fallback)?,
                State::Validating {
                    index,
                    reply,
                    fallback,
                } => self.check_reply(index, &reply, fallback)?,
                State::Done => {
                    debug!(answers = self.answers.len(), "question set complete");
                    return Ok(self.answers);
                }
                State::Cancelled => return Err(self.cancel()),
            };
        }
    }

    fn ask_next(&mut self, index: usize) -> Result<State, AskError> {
        let Some((key, spec)) = self.questions.get(index) else {
            return Ok(State::Done);
        };

        if !dependencies_met(&spec.depends_on, &self.answers) {
            debug!(key, "dependencies unmet, skipping");
            self.answers.record(key, None);
            return Ok(State::AskNext(index + 1));
        }

        let fallback = spec.resolve_default(&self.answers);
        let view = build_prompt(key, spec, fallback.as_ref());
        if let Some(message) = &view.message {
            self.out.write_all(render_message(message).as_bytes())?;
            self.out.flush()?;
        }

        debug!(key, index, "asking");
        Ok(State::WaitingForReply {
            index,
            view,
            fallback,
        })
    }

    fn wait_for_reply(
        &mut self,
        index: usize,
        view: &PromptView,
        fallback: Option<Answer>,
    ) -> Result<State, AskError> {
        let reply = if view.masked {
            self.read_masked(&view.prompt)?
        } else {
            self.source.read_line(&view.prompt)?
        };

        Ok(match reply {
            Some(reply) => {
                if !view.masked {
                    trace!(index, reply = reply.as_str(), "reply received");
                }
                State::Validating {
                    index,
                    reply,
                    fallback,
                }
            }
            None => State::Cancelled,
        })
    }

    fn read_masked(&mut self, prompt: &str) -> Result<Option<String>, AskError> {
        self.out.write_all(prompt.as_bytes())?;
        self.out.flush()?;

        self.source.set_raw_mode(true)?;
        let captured = self.capture_keys(prompt);
        self.source.set_raw_mode(false)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        captured
    }

    fn capture_keys(&mut self, prompt: &str) -> Result<Option<String>, AskError> {
        let mut capture = PasswordCapture::new(prompt, self.mask);
        while let Some(key) = self.source.read_key()? {
            match capture.feed(key, &mut *self.out)? {
                Capture::Pending => continue,
                Capture::Complete(reply) => return Ok(Some(reply)),
                Capture::Interrupted => {
                    debug!("masked reply interrupted");
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    fn check_reply(
        &mut self,
        index: usize,
        reply: &str,
        fallback: Option<Answer>,
    ) -> Result<State, AskError> {
        let Some((key, spec)) = self.questions.get(index) else {
            return Ok(State::Done);
        };

        let answer = interpret(reply);
        match validate(spec, answer.as_ref(), fallback.as_ref()) {
            Ok(()) => {
                self.answers.record(key, answer.or(fallback));
                Ok(State::AskNext(index + 1))
            }
            Err(err) => {
                debug!(key, code = err.code, "reply rejected");
                self.out.write_all(render_error(&err.message).as_bytes())?;
                self.out.flush()?;
                Ok(State::AskNext(index))
            }
        }
    }

    /// Only reached while a key is still unrecorded.
    fn cancel(self) -> AskError {
        let answered = self.answers.len();
        debug!(answered, "line source closed before completion");
        AskError::Cancelled {
            answered,
            answers: self.answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    use crate::condition::Condition;
    use crate::source::{Key, ScriptedSource};
    use crate::spec::question::QuestionSpec;

    fn run(
        questions: &QuestionSet,
        source: &mut ScriptedSource,
    ) -> (Result<AnswerMap, AskError>, String) {
        let mut out = Vec::new();
        let result = Sequencer::new(questions, source, &mut out).run();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn rejected_reply_reasks_same_question() {
        let questions = QuestionSet::new()
            .with("ok", QuestionSpec::confirm())
            .unwrap();
        let mut source = ScriptedSource::from_lines(["maybe", "yes"]);
        let (result, out) = run(&questions, &mut source);
        assert_eq!(result.unwrap().get("ok"), Some(&Answer::Bool(true)));
        assert!(out.contains("Invalid value."));
        assert_eq!(
            source.log().borrow().prompts,
            vec![" - yes/no: ", " - yes/no: "]
        );
    }

    #[test]
    fn skipped_question_is_recorded_without_prompt() {
        let questions = QuestionSet::new()
            .with("db", QuestionSpec::text())
            .unwrap()
            .with(
                "ssl",
                QuestionSpec::confirm().depends_on("db", Condition::equals("postgres")),
            )
            .unwrap()
            .with("name", QuestionSpec::text())
            .unwrap();
        let mut source = ScriptedSource::from_lines(["sqlite", "app"]);
        let (result, _) = run(&questions, &mut source);
        let answers = result.unwrap();
        assert_eq!(answers.len(), 3);
        assert!(answers.contains_key("ssl"));
        assert_eq!(answers.get("ssl"), None);
        assert_eq!(answers.get("name"), Some(&Answer::text("app")));
        assert_eq!(source.log().borrow().prompts, vec![" - db: ", " - name: "]);
    }

    #[test]
    fn masked_reply_is_captured_from_keys() {
        let questions = QuestionSet::new()
            .with("secret", QuestionSpec::password())
            .unwrap();
        let mut source = ScriptedSource::new().with_keystrokes("s3");
        let mut out = Vec::new();
        let answers = Sequencer::new(&questions, &mut source, &mut out)
            .with_mask('#')
            .run()
            .unwrap();
        assert_eq!(answers.get("secret"), Some(&Answer::text("s3")));
        assert_eq!(String::from_utf8(out).unwrap(), " - secret: ##\n");
        assert_eq!(source.log().borrow().raw_mode_toggles, 2);
    }

    struct RawFlagSource {
        inner: ScriptedSource,
        raw: Rc<Cell<bool>>,
    }

    impl LineSource for RawFlagSource {
        fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.inner.read_line(prompt)
        }

        fn read_key(&mut self) -> io::Result<Option<Key>> {
            self.inner.read_key()
        }

        fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
            self.raw.set(enabled);
            Ok(())
        }

        fn close(&mut self) {
            self.inner.close();
        }

        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
    }

    struct RawCheckedOut {
        raw: Rc<Cell<bool>>,
        written: Vec<u8>,
        newline_while_raw: bool,
    }

    impl Write for RawCheckedOut {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.raw.get() && buf.contains(&b'\n') {
                self.newline_while_raw = true;
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn masked_reply_ends_its_line_after_leaving_raw_mode() {
        let questions = QuestionSet::new()
            .with("secret", QuestionSpec::password())
            .unwrap()
            .with("next", QuestionSpec::text())
            .unwrap();
        let raw = Rc::new(Cell::new(false));
        let mut source = RawFlagSource {
            inner: ScriptedSource::new().with_keystrokes("pw").with_line("n"),
            raw: Rc::clone(&raw),
        };
        let mut out = RawCheckedOut {
            raw,
            written: Vec::new(),
            newline_while_raw: false,
        };

        let answers = Sequencer::new(&questions, &mut source, &mut out)
            .run()
            .unwrap();
        assert_eq!(answers.get("secret"), Some(&Answer::text("pw")));
        assert!(!out.newline_while_raw);
        assert_eq!(String::from_utf8(out.written).unwrap(), " - secret: **\n");
    }

    #[test]
    fn interrupt_during_masked_reply_cancels() {
        let questions = QuestionSet::new()
            .with("user", QuestionSpec::text())
            .unwrap()
            .with("secret", QuestionSpec::password())
            .unwrap();
        let mut source = ScriptedSource::new()
            .with_line("root")
            .with_key(Key::Char('x'))
            .with_key(Key::Interrupt);
        let (result, _) = run(&questions, &mut source);
        match result {
            Err(AskError::Cancelled { answered, answers }) => {
                assert_eq!(answered, 1);
                assert_eq!(answers.get("user"), Some(&Answer::text("root")));
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn last_reply_completes_without_reading_again() {
        let questions = QuestionSet::new()
            .with("one", QuestionSpec::text())
            .unwrap()
            .with("two", QuestionSpec::text())
            .unwrap();

        let mut complete = ScriptedSource::from_lines(["a", "b"]);
        let (result, _) = run(&questions, &mut complete);
        assert_eq!(result.unwrap().len(), 2);
        assert_eq!(complete.log().borrow().prompts.len(), 2);
        assert!(!complete.is_closed());

        let mut short = ScriptedSource::from_lines(["a"]);
        let (result, _) = run(&questions, &mut short);
        match result {
            Err(AskError::Cancelled { answered, .. }) => assert_eq!(answered, 1),
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn long_question_sets_run_without_recursion() {
        let mut questions = QuestionSet::new();
        for index in 0..10_000 {
            questions
                .push(
                    format!("q{}", index),
                    QuestionSpec::text().depends_on("never", Condition::equals(true)),
                )
                .unwrap();
        }
        let mut source = ScriptedSource::new();
        let (result, _) = run(&questions, &mut source);
        assert_eq!(result.unwrap().len(), 10_000);
    }
}
