// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Visual feedback for note onsets.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use crate::notes::Onset;

/// Number of distinct background colours natural notes cycle through.
const NOTE_COLORS: u16 = 14;

/// Something that shows the player which notes were struck.
pub trait Feedback {
    /// Shown once before the engine starts.
    fn banner(&mut self, key_count: usize) -> io::Result<()>;

    /// Called once for every onset, after its tone was submitted.
    fn note_on(&mut self, onset: &Onset) -> io::Result<()>;
}

/// Prints one coloured mark per onset to a terminal.
///
/// The terminal is in raw mode while playing, so line breaks are written as "\r\n".
pub struct TerminalFeedback<W: Write> {
    out: W,
}

impl TerminalFeedback<io::Stdout> {
    pub fn stdout() -> TerminalFeedback<io::Stdout> {
        TerminalFeedback::new(io::stdout())
    }
}

impl<W: Write> TerminalFeedback<W> {
    pub fn new(out: W) -> TerminalFeedback<W> {
        TerminalFeedback { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// The background colour for a natural note on the given key.
fn note_color(code: u16) -> Color {
    // Skip 0 (black) so every mark stays visible.
    Color::AnsiValue((code % NOTE_COLORS + 1) as u8)
}

/// The text printed for an onset.
fn mark(onset: &Onset) -> String {
    let key = onset.identity.key;
    match key.as_char() {
        Some(c) if onset.identity.shifted => format!("[{}]", c.to_ascii_uppercase()),
        Some(c) => format!(" {} ", c.to_ascii_lowercase()),
        None if onset.identity.shifted => format!("[{}]", key),
        None => format!(" {} ", key),
    }
}

impl<W: Write> Feedback for TerminalFeedback<W> {
    fn banner(&mut self, key_count: usize) -> io::Result<()> {
        let rule = "=".repeat(50);
        queue!(
            self.out,
            SetForegroundColor(Color::Cyan),
            Print(format!("{}\r\n", rule)),
            Print(format!("    keypiano: {} keys, sine voice\r\n", key_count)),
            Print("    Shift raises a semitone, Esc exits\r\n"),
            Print(format!("{}\r\n", rule)),
            ResetColor,
        )?;
        self.out.flush()
    }

    fn note_on(&mut self, onset: &Onset) -> io::Result<()> {
        let (background, foreground) = if onset.identity.shifted {
            (Color::White, Color::Black)
        } else {
            (note_color(onset.identity.key.code()), Color::White)
        };

        queue!(
            self.out,
            SetBackgroundColor(background),
            SetForegroundColor(foreground),
            Print(mark(onset)),
            ResetColor,
        )?;
        self.out.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::notes::NoteIdentity;
    use crate::pitch::KeyCode;

    fn onset(c: char, shifted: bool) -> Onset {
        Onset {
            identity: NoteIdentity::new(KeyCode::from_char(c), shifted),
            frequency: 440.0,
        }
    }

    #[test]
    fn test_marks() {
        assert_eq!(" q ", mark(&onset('Q', false)));
        assert_eq!("[Q]", mark(&onset('Q', true)));
        assert_eq!(" 1 ", mark(&onset('1', false)));
    }

    #[test]
    fn test_note_colors() {
        // 'A' is 65, 65 % 14 + 1 = 10.
        assert_eq!(Color::AnsiValue(10), note_color(KeyCode::from_char('A').code()));
        for code in 0..256 {
            assert_ne!(Color::AnsiValue(0), note_color(code));
        }
    }

    #[test]
    fn test_note_on_writes_mark() {
        let mut feedback = TerminalFeedback::new(Vec::new());
        feedback.note_on(&onset('Z', false)).unwrap();
        feedback.note_on(&onset('Z', true)).unwrap();

        let written = String::from_utf8(feedback.into_inner()).unwrap();
        let natural = written.find(" z ").unwrap();
        let shifted = written.find("[Z]").unwrap();
        assert!(natural < shifted);
    }

    #[test]
    fn test_banner() {
        let mut feedback = TerminalFeedback::new(Vec::new());
        feedback.banner(36).unwrap();

        let written = String::from_utf8(feedback.into_inner()).unwrap();
        assert!(written.contains("36 keys"));
        assert!(written.contains("\r\n"));
    }
}
