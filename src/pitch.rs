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

//! Key-to-pitch mapping.
//!
//! Keys are laid out along a C major scale in equal temperament: every seven
//! keys climb one octave, starting from a fixed reference frequency.

use std::fmt;

use tracing::warn;

/// The reference frequency for the first key in a layout (low C).
pub const BASE_FREQUENCY: f64 = 65.41;

/// Semitone offsets of each degree of the major scale.
pub const MAJOR_SCALE: [u32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// The default playing layout: number row, then the three letter rows.
pub const DEFAULT_LAYOUT: &str = "1234567890QWERTYUIOPASDFGHJKLZXCVBNM";

/// An opaque identifier for a physical key. Letters and digits use their
/// upper-case ASCII value, which lines up with the usual virtual-key numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(u16);

impl KeyCode {
    /// Creates a key code from a raw virtual key value.
    pub const fn new(code: u16) -> KeyCode {
        KeyCode(code)
    }

    /// Creates a key code from a layout character. Letters are case-insensitive.
    /// Characters beyond the 16-bit key code range have no key code.
    pub fn try_from_char(c: char) -> Option<KeyCode> {
        u16::try_from(u32::from(c.to_ascii_uppercase()))
            .ok()
            .map(KeyCode)
    }

    #[cfg(test)]
    pub fn from_char(c: char) -> KeyCode {
        KeyCode::try_from_char(c).expect("test key characters fit in a key code")
    }

    /// Returns the raw virtual key value.
    pub fn code(&self) -> u16 {
        self.0
    }

    /// Returns the character printed on the key, if it is a printable ASCII key.
    pub fn as_char(&self) -> Option<char> {
        u8::try_from(self.0)
            .ok()
            .map(char::from)
            .filter(|c| c.is_ascii_graphic())
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) => write!(f, "{}", c),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Parses a layout string into key codes, skipping whitespace and characters that
/// have no key code.
pub fn parse_layout(layout: &str) -> Vec<KeyCode> {
    layout
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| {
            let key = KeyCode::try_from_char(c);
            if key.is_none() {
                warn!(character = %c, "Skipping layout character with no key code");
            }
            key
        })
        .collect()
}

/// Returns the frequency of the given position along the major scale.
pub fn scale_frequency(base_frequency: f64, index: usize) -> f64 {
    let octave = index / MAJOR_SCALE.len();
    let step = index % MAJOR_SCALE.len();
    let semitones = (octave * 12) as f64 + MAJOR_SCALE[step] as f64;

    base_frequency * 2f64.powf(semitones / 12.0)
}

/// Raises a frequency by one equal-tempered semitone.
pub fn shift_semitone(frequency: f64) -> f64 {
    frequency * 2f64.powf(1.0 / 12.0)
}

/// An ordered, read-only mapping of keys to their base frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTable {
    entries: Vec<(KeyCode, f64)>,
}

impl PitchTable {
    /// Builds a table from the given keys using the default reference frequency.
    pub fn build(keys: &[KeyCode]) -> PitchTable {
        PitchTable::with_base_frequency(keys, BASE_FREQUENCY)
    }

    /// Builds a table from the given keys. A key that appears more than once keeps
    /// the frequency of its first position; later positions are skipped but still
    /// advance the scale.
    pub fn with_base_frequency(keys: &[KeyCode], base_frequency: f64) -> PitchTable {
        let entries = keys
            .iter()
            .enumerate()
            .fold(Vec::with_capacity(keys.len()), |mut entries, (index, key)| {
                if !entries.iter().any(|(existing, _)| existing == key) {
                    entries.push((*key, scale_frequency(base_frequency, index)));
                }
                entries
            });

        PitchTable { entries }
    }

    /// Returns the base frequency for the given key.
    pub fn frequency(&self, key: KeyCode) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, frequency)| *frequency)
    }

    /// Iterates over the keys and their frequencies in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (KeyCode, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Returns the keys in layout order.
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
