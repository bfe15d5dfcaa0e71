//! Line sources and the session handle that owns one.
//!
//! A [`LineSource`] reads prompted lines and, for masked questions, raw
//! keystrokes. A [`Session`] holds at most one open source and hands it to
//! successive question batches: an open source is resumed, a missing or
//! closed one is reopened through the session's opener.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::error::AskError;

/// Glyph echoed for each character of a masked reply.
pub const DEFAULT_MASK: char = '*';

/// A keystroke read while capturing a masked reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    /// Ctrl-C.
    Interrupt,
}

pub trait LineSource {
    /// Shows `prompt` and reads one line without its terminator.
    /// `Ok(None)` means the source closed.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Reads one keystroke. `Ok(None)` means the source closed.
    fn read_key(&mut self) -> io::Result<Option<Key>>;

    /// Switches keystroke capture on or off around masked replies.
    fn set_raw_mode(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }

    /// Stops reading until [`LineSource::resume`] without releasing the source.
    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

type Opener<S> = Box<dyn FnMut() -> io::Result<S>>;

/// Owner of the shared line source.
pub struct Session<S> {
    handle: Option<S>,
    opener: Opener<S>,
    mask: char,
}

impl<S: LineSource> Session<S> {
    pub fn new<F>(opener: F) -> Self
    where
        F: FnMut() -> io::Result<S> + 'static,
    {
        Self {
            handle: None,
            opener: Box::new(opener),
            mask: DEFAULT_MASK,
        }
    }

    /// Session whose opener yields `source` once; later opens fail.
    pub fn once(source: S) -> Self
    where
        S: 'static,
    {
        let mut pending = Some(source);
        Self::new(move || {
            pending.take().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotConnected, "line source already consumed")
            })
        })
    }

    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = mask;
        self
    }

    pub fn mask(&self) -> char {
        self.mask
    }

    pub fn is_open(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|source| !source.is_closed())
    }

    /// Opens the source ahead of a batch, so the batch borrows it.
    pub fn open(&mut self) -> Result<&mut S, AskError> {
        self.acquire().map(|(source, _)| source)
    }

    pub fn source(&self) -> Option<&S> {
        self.handle.as_ref()
    }

    /// Returns the source for a batch and whether this call opened it.
    pub(crate) fn acquire(&mut self) -> Result<(&mut S, bool), AskError> {
        if self.handle.as_ref().is_some_and(|source| source.is_closed()) {
            self.handle = None;
        }

        let created = match self.handle {
            Some(ref mut source) => {
                tracing::debug!("resuming open line source");
                source.resume();
                false
            }
            None => {
                tracing::debug!("opening line source");
                self.handle = Some((self.opener)()?);
                true
            }
        };

        match self.handle.as_mut() {
            Some(source) => Ok((source, created)),
            None => Err(AskError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "line source unavailable",
            ))),
        }
    }

    /// Ends a batch. A completed batch closes only a source it opened and
    /// pauses a borrowed one; a failed batch tears the source down.
    pub(crate) fn release(&mut self, created: bool, completed: bool) {
        if completed && !created {
            if let Some(source) = self.handle.as_mut() {
                source.pause();
            }
            return;
        }
        if let Some(mut source) = self.handle.take() {
            tracing::debug!(completed, "closing line source");
            source.close();
        }
    }
}

/// One scripted input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Line(String),
    Key(Key),
    /// The operator closed the input, e.g. with Ctrl-D.
    Close,
}

/// What a [`ScriptedSource`] observed, shared so it outlives the source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceLog {
    pub prompts: Vec<String>,
    pub pauses: usize,
    pub resumes: usize,
    pub closes: usize,
    pub raw_mode_toggles: usize,
}

/// Line source replaying a fixed script; running out of script closes it.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Scripted>,
    closed: bool,
    log: Rc<RefCell<SourceLog>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source replying with each of `lines` in turn.
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        lines
            .into_iter()
            .fold(Self::new(), |source, line| source.with_line(line))
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.script.push_back(Scripted::Line(line.into()));
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.script.push_back(Scripted::Key(key));
        self
    }

    /// Types `text` one key at a time, then presses enter.
    pub fn with_keystrokes(mut self, text: &str) -> Self {
        self.script
            .extend(text.chars().map(|c| Scripted::Key(Key::Char(c))));
        self.script.push_back(Scripted::Key(Key::Enter));
        self
    }

    pub fn with_close(mut self) -> Self {
        self.script.push_back(Scripted::Close);
        self
    }

    pub fn log(&self) -> Rc<RefCell<SourceLog>> {
        Rc::clone(&self.log)
    }

    fn next_event(&mut self) -> Option<Scripted> {
        if self.closed {
            return None;
        }
        match self.script.pop_front() {
            None | Some(Scripted::Close) => {
                self.closed = true;
                None
            }
            Some(event) => Some(event),
        }
    }
}

fn out_of_order(expected: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("script expected {}", expected),
    )
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.log.borrow_mut().prompts.push(prompt.to_string());
        match self.next_event() {
            None => Ok(None),
            Some(Scripted::Line(line)) => Ok(Some(line)),
            Some(_) => Err(out_of_order("a line")),
        }
    }

    fn read_key(&mut self) -> io::Result<Option<Key>> {
        match self.next_event() {
            None => Ok(None),
            Some(Scripted::Key(key)) => Ok(Some(key)),
            Some(_) => Err(out_of_order("a keystroke")),
        }
    }

    fn set_raw_mode(&mut self, _enabled: bool) -> io::Result<()> {
        self.log.borrow_mut().raw_mode_toggles += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.log.borrow_mut().pauses += 1;
    }

    fn resume(&mut self) {
        self.log.borrow_mut().resumes += 1;
    }

    fn close(&mut self) {
        self.closed = true;
        self.log.borrow_mut().closes += 1;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_runs_out_into_closure() {
        let mut source = ScriptedSource::from_lines(["a"]);
        assert_eq!(source.read_line(" - x: ").unwrap().as_deref(), Some("a"));
        assert_eq!(source.read_line(" - y: ").unwrap(), None);
        assert!(source.is_closed());
        assert_eq!(source.log().borrow().prompts, vec![" - x: ", " - y: "]);
    }

    #[test]
    fn keystrokes_end_with_enter() {
        let mut source = ScriptedSource::new().with_keystrokes("ab");
        assert_eq!(source.read_key().unwrap(), Some(Key::Char('a')));
        assert_eq!(source.read_key().unwrap(), Some(Key::Char('b')));
        assert_eq!(source.read_key().unwrap(), Some(Key::Enter));
        assert_eq!(source.read_key().unwrap(), None);
    }

    #[test]
    fn mixing_lines_and_keys_is_an_error() {
        let mut source = ScriptedSource::new().with_key(Key::Enter);
        assert!(source.read_line("> ").is_err());
    }

    #[test]
    fn session_reuses_open_source() {
        let mut session = Session::once(ScriptedSource::new());
        let (_, created) = session.acquire().unwrap();
        assert!(created);
        let (_, created) = session.acquire().unwrap();
        assert!(!created);
        let log = session.source().unwrap().log();
        assert_eq!(log.borrow().resumes, 1);
    }

    #[test]
    fn session_reopens_after_release() {
        let mut opened = 0;
        let mut session = Session::new(move || {
            opened += 1;
            Ok(ScriptedSource::from_lines([format!("open {}", opened)]))
        });
        session.acquire().unwrap();
        session.release(true, true);
        assert!(!session.is_open());
        let (source, created) = session.acquire().unwrap();
        assert!(created);
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("open 2"));
    }

    #[test]
    fn borrowed_source_is_paused_not_closed() {
        let mut session = Session::once(ScriptedSource::new());
        session.open().unwrap();
        let log = session.source().unwrap().log();
        session.release(false, true);
        assert!(session.is_open());
        assert_eq!(log.borrow().pauses, 1);
        assert_eq!(log.borrow().closes, 0);
    }
}
