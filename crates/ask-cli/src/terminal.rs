use std::collections::VecDeque;
use std::io::{self, IsTerminal, Write};

use ask_spec::{Capture, Key, LineSource};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::debug;

/// Line source over the process's stdin and stdout.
///
/// On a real terminal every reply is read key by key in raw mode, so Ctrl-C
/// closes the source instead of killing the process. When stdin is piped,
/// replies are plain lines and a masked reply is replayed as keystrokes.
pub struct TerminalSource {
    interactive: bool,
    pending: VecDeque<Key>,
    raw: bool,
    paused: bool,
    closed: bool,
}

impl TerminalSource {
    pub fn stdin() -> Self {
        let interactive = io::stdin().is_terminal();
        debug!(interactive, "terminal line source opened");
        Self {
            interactive,
            pending: VecDeque::new(),
            raw: false,
            paused: false,
            closed: false,
        }
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            self.closed = true;
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn edit_line<W: Write>(&mut self, out: &mut W) -> io::Result<Option<String>> {
        let mut edit = LineEdit::default();
        while let Some(key) = self.read_terminal_key()? {
            match edit.feed(key, out)? {
                Capture::Pending => continue,
                Capture::Complete(line) => return Ok(Some(line)),
                Capture::Interrupted => {
                    debug!("line reply interrupted");
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    fn read_terminal_key(&mut self) -> io::Result<Option<Key>> {
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let control = key.modifiers.contains(KeyModifiers::CONTROL);
            let mapped = match key.code {
                KeyCode::Char('c') if control => Key::Interrupt,
                KeyCode::Char('d') if control => {
                    self.closed = true;
                    return Ok(None);
                }
                KeyCode::Char(c) => Key::Char(c),
                KeyCode::Backspace => Key::Backspace,
                KeyCode::Enter => Key::Enter,
                _ => continue,
            };
            return Ok(Some(mapped));
        }
    }
}

/// Visible line editing for replies typed in raw mode.
#[derive(Debug, Default)]
struct LineEdit {
    buffer: String,
}

impl LineEdit {
    fn feed<W: Write>(&mut self, key: Key, out: &mut W) -> io::Result<Capture> {
        let capture = match key {
            Key::Enter => Capture::Complete(std::mem::take(&mut self.buffer)),
            Key::Interrupt => Capture::Interrupted,
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    out.write_all(b"\x08 \x08")?;
                }
                Capture::Pending
            }
            Key::Char(c) => {
                self.buffer.push(c);
                write!(out, "{}", c)?;
                Capture::Pending
            }
        };
        out.flush()?;
        Ok(capture)
    }
}

impl LineSource for TerminalSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        if !self.interactive {
            return self.next_line();
        }

        self.set_raw_mode(true)?;
        let edited = self.edit_line(&mut stdout);
        self.set_raw_mode(false)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        edited
    }

    fn read_key(&mut self) -> io::Result<Option<Key>> {
        if self.closed {
            return Ok(None);
        }
        if self.interactive {
            return self.read_terminal_key();
        }
        if self.pending.is_empty() {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            self.pending.extend(line.chars().map(Key::Char));
            self.pending.push_back(Key::Enter);
        }
        Ok(self.pending.pop_front())
    }

    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
        if !self.interactive || self.raw == enabled {
            return Ok(());
        }
        if enabled {
            enable_raw_mode()?;
        } else {
            disable_raw_mode()?;
        }
        self.raw = enabled;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn close(&mut self) {
        if self.raw {
            let _ = disable_raw_mode();
            self.raw = false;
        }
        self.pending.clear();
        self.closed = true;
        debug!(paused = self.paused, "terminal line source closed");
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for TerminalSource {
    fn drop(&mut self) {
        if self.raw {
            let _ = disable_raw_mode();
        }
    }
}
