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
use std::collections::HashSet;
use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode as TermKeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, ModifierKeyCode, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tracing::{debug, info, warn};

use super::{KeySampler, KeyboardError};
use crate::pitch::KeyCode;

/// US layout symbols typed with Shift held on the number row, paired with their base key.
const SHIFTED_DIGITS: [(char, char); 10] = [
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
];

/// Held-key bookkeeping driven by terminal key events.
#[derive(Debug, Default)]
struct KeyState {
    held: HashSet<KeyCode>,
    shift_keys: HashSet<ModifierKeyCode>,
    shift_flag: bool,
    exit: bool,
}

impl KeyState {
    fn apply(&mut self, event: &KeyEvent) {
        let pressed = matches!(event.kind, KeyEventKind::Press | KeyEventKind::Repeat);

        match event.code {
            TermKeyCode::Esc => self.exit |= pressed,
            TermKeyCode::Char('c') | TermKeyCode::Char('C')
                if event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.exit |= pressed
            }
            TermKeyCode::Modifier(
                code @ (ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift),
            ) => {
                if pressed {
                    self.shift_keys.insert(code);
                } else {
                    self.shift_keys.remove(&code);
                    self.shift_flag = false;
                }
            }
            TermKeyCode::Char(c) => {
                self.shift_flag = event.modifiers.contains(KeyModifiers::SHIFT);

                let Some(key) = base_key(c) else {
                    return;
                };
                if pressed {
                    self.held.insert(key);
                } else {
                    self.held.remove(&key);
                }
            }
            _ => {}
        }
    }

    fn is_modifier_held(&self) -> bool {
        !self.shift_keys.is_empty() || self.shift_flag
    }
}

/// Maps the character a key produced back to the key itself, so that a key held
/// across a Shift toggle keeps a single identity.
fn base_key(c: char) -> Option<KeyCode> {
    let c = SHIFTED_DIGITS
        .iter()
        .find(|(shifted, _)| *shifted == c)
        .map_or(c, |(_, base)| *base);
    KeyCode::try_from_char(c)
}

/// A keyboard sampler backed by the controlling terminal.
///
/// The terminal is put into raw mode and asked to report press, repeat and release
/// events for every key. Both are undone on drop.
pub struct TerminalKeyboard {
    state: KeyState,
    enhanced: bool,
}

impl TerminalKeyboard {
    /// Takes over the terminal.
    pub fn new() -> Result<TerminalKeyboard, KeyboardError> {
        // Windows consoles report key releases natively.
        let enhanced = if cfg!(windows) {
            false
        } else if terminal::supports_keyboard_enhancement()? {
            true
        } else {
            return Err(KeyboardError::ReleaseEventsUnsupported);
        };

        terminal::enable_raw_mode()?;
        if enhanced {
            if let Err(e) = execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            ) {
                let _ = terminal::disable_raw_mode();
                return Err(e.into());
            }
        }

        info!(enhanced, "Keyboard captured.");
        Ok(TerminalKeyboard {
            state: KeyState::default(),
            enhanced,
        })
    }
}

impl KeySampler for TerminalKeyboard {
    fn refresh(&mut self) -> Result<(), KeyboardError> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key_event) => self.state.apply(&key_event),
                Event::FocusLost => {
                    // Releases that happen while unfocused never reach us.
                    debug!("Focus lost, releasing all keys");
                    self.state.held.clear();
                    self.state.shift_keys.clear();
                    self.state.shift_flag = false;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn is_held(&self, key: KeyCode) -> bool {
        self.state.held.contains(&key)
    }

    fn is_modifier_held(&self) -> bool {
        self.state.is_modifier_held()
    }

    fn is_exit_requested(&self) -> bool {
        self.state.exit
    }
}

impl Drop for TerminalKeyboard {
    fn drop(&mut self) {
        if self.enhanced {
            if let Err(e) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
                warn!(err = e.to_string(), "Unable to restore keyboard flags");
            }
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(err = e.to_string(), "Unable to leave raw mode");
        }
    }
}
