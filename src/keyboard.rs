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

//! Physical key state sampling.

use std::io;

use crate::pitch::KeyCode;

#[cfg(test)]
pub mod mock;
pub mod terminal;

pub use terminal::TerminalKeyboard;

/// Errors raised while reading the keyboard.
#[derive(Debug, thiserror::Error)]
pub enum KeyboardError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("this terminal does not report key releases; try a terminal that supports the kitty keyboard protocol")]
    ReleaseEventsUnsupported,
}

/// Answers whether keys are currently held down.
///
/// Queries must not block. Each answer is a best-effort snapshot and no consistency
/// is expected across calls within one tick.
pub trait KeySampler {
    /// Brings the snapshot up to date. Called once at the start of every tick.
    fn refresh(&mut self) -> Result<(), KeyboardError> {
        Ok(())
    }

    /// Returns true if the given key is held.
    fn is_held(&self, key: KeyCode) -> bool;

    /// Returns true if the pitch modifier (Shift) is held.
    fn is_modifier_held(&self) -> bool;

    /// Returns true if the player asked to stop.
    fn is_exit_requested(&self) -> bool;
}
