use std::io::{self, Write};

use crate::source::Key;

/// Outcome of feeding one keystroke to a [`PasswordCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Pending,
    Complete(String),
    Interrupted,
}

/// Collects a masked reply one keystroke at a time, echoing a mask glyph per
/// character and redrawing the line on backspace.
pub struct PasswordCapture<'p> {
    prompt: &'p str,
    mask: char,
    buffer: String,
}

impl<'p> PasswordCapture<'p> {
    pub fn new(prompt: &'p str, mask: char) -> Self {
        Self {
            prompt,
            mask,
            buffer: String::new(),
        }
    }

    pub fn feed<W: Write>(&mut self, key: Key, out: &mut W) -> io::Result<Capture> {
        let capture = match key {
            // the caller ends the line once raw mode is off
            Key::Enter => Capture::Complete(std::mem::take(&mut self.buffer)),
            Key::Interrupt => Capture::Interrupted,
            Key::Backspace => {
                self.buffer.pop();
                let masked = self.mask.to_string().repeat(self.buffer.chars().count());
                write!(out, "\r\x1b[2K{}{}", self.prompt, masked)?;
                Capture::Pending
            }
            Key::Char(c) => {
                self.buffer.push(c);
                write!(out, "{}", self.mask)?;
                Capture::Pending
            }
        };
        out.flush()?;
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(keys: &[Key]) -> (Vec<Capture>, String) {
        let mut out = Vec::new();
        let mut capture = PasswordCapture::new(" - pin: ", '*');
        let results = keys
            .iter()
            .map(|key| capture.feed(*key, &mut out).unwrap())
            .collect();
        (results, String::from_utf8(out).unwrap())
    }

    #[test]
    fn echoes_one_mask_per_character() {
        let (results, echoed) = feed_all(&[Key::Char('a'), Key::Char('b'), Key::Enter]);
        assert_eq!(results.last(), Some(&Capture::Complete("ab".into())));
        assert_eq!(echoed, "**");
    }

    #[test]
    fn backspace_edits_and_redraws() {
        let (results, echoed) = feed_all(&[
            Key::Char('a'),
            Key::Char('b'),
            Key::Backspace,
            Key::Char('c'),
            Key::Enter,
        ]);
        assert_eq!(results.last(), Some(&Capture::Complete("ac".into())));
        assert_eq!(echoed, "**\r\x1b[2K - pin: **");
    }

    #[test]
    fn backspace_on_empty_buffer_is_harmless() {
        let (results, _) = feed_all(&[Key::Backspace, Key::Enter]);
        assert_eq!(results.last(), Some(&Capture::Complete(String::new())));
    }

    #[test]
    fn interrupt_stops_capture() {
        let (results, _) = feed_all(&[Key::Char('a'), Key::Interrupt]);
        assert_eq!(results.last(), Some(&Capture::Interrupted));
    }
}
