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

//! Note onset and release detection.
//!
//! The tracker turns the continuous "is this key held" answers of the keyboard into
//! discrete onsets. A note is identified by its key and by whether the pitch modifier
//! was held, so toggling the modifier under a held key starts a new note.

use std::collections::HashSet;
use std::fmt;

use crate::keyboard::KeySampler;
use crate::pitch::{self, KeyCode, PitchTable};

/// The identity of a sounding note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteIdentity {
    pub key: KeyCode,
    pub shifted: bool,
}

impl NoteIdentity {
    pub fn new(key: KeyCode, shifted: bool) -> NoteIdentity {
        NoteIdentity { key, shifted }
    }

    /// The same key with the modifier flipped.
    fn counterpart(&self) -> NoteIdentity {
        NoteIdentity::new(self.key, !self.shifted)
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shifted {
            write!(f, "{}#", self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}

/// A newly started note and the frequency it should sound at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onset {
    pub identity: NoteIdentity,
    pub frequency: f64,
}

/// Tracks which notes are currently held.
#[derive(Debug, Default)]
pub struct NoteTracker {
    active: HashSet<NoteIdentity>,
}

impl NoteTracker {
    pub fn new() -> NoteTracker {
        NoteTracker::default()
    }

    /// Processes one key for one tick. Returns an onset if the key went down, or if
    /// the modifier changed while it stayed down.
    pub fn step(
        &mut self,
        key: KeyCode,
        base_frequency: f64,
        held: bool,
        shifted: bool,
    ) -> Option<Onset> {
        let identity = NoteIdentity::new(key, shifted);

        if !held {
            self.active.remove(&identity);
            self.active.remove(&identity.counterpart());
            return None;
        }

        if !self.active.insert(identity) {
            return None;
        }
        self.active.remove(&identity.counterpart());

        let frequency = if shifted {
            pitch::shift_semitone(base_frequency)
        } else {
            base_frequency
        };

        Some(Onset {
            identity,
            frequency,
        })
    }

    /// Processes every key in the table for one tick, returning the onsets in
    /// layout order.
    pub fn tick<S: KeySampler + ?Sized>(
        &mut self,
        table: &PitchTable,
        sampler: &S,
        shifted: bool,
    ) -> Vec<Onset> {
        table
            .iter()
            .filter_map(|(key, frequency)| {
                self.step(key, frequency, sampler.is_held(key), shifted)
            })
            .collect()
    }

    /// Returns true if the given note is being tracked as held.
    pub fn is_active(&self, identity: NoteIdentity) -> bool {
        self.active.contains(&identity)
    }

    /// Returns the number of held notes.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keyboard::mock::{ScriptedKeyboard, Snapshot};
    use crate::keyboard::KeySampler;
    use crate::pitch::parse_layout;

    const C2: f64 = 65.41;

    fn key(c: char) -> KeyCode {
        KeyCode::from_char(c)
    }

    #[test]
    fn test_single_onset_while_held() {
        let mut tracker = NoteTracker::new();
        let a = NoteIdentity::new(key('A'), false);

        assert_eq!(None, tracker.step(key('A'), C2, false, false));

        let onset = tracker.step(key('A'), C2, true, false).unwrap();
        assert_eq!(a, onset.identity);
        assert_eq!(C2, onset.frequency);
        assert!(tracker.is_active(a));

        // Sustained for a few ticks: nothing new.
        for _ in 0..3 {
            assert_eq!(None, tracker.step(key('A'), C2, true, false));
        }

        assert_eq!(None, tracker.step(key('A'), C2, false, false));
        assert!(!tracker.is_active(a));
        assert_eq!(0, tracker.active_count());

        // Pressing again is a fresh onset.
        assert!(tracker.step(key('A'), C2, true, false).is_some());
    }

    #[test]
    fn test_modifier_toggle_while_held() {
        let mut tracker = NoteTracker::new();
        let natural = NoteIdentity::new(key('A'), false);
        let shifted = NoteIdentity::new(key('A'), true);

        tracker.step(key('A'), C2, true, false).unwrap();

        let onset = tracker.step(key('A'), C2, true, true).unwrap();
        assert_eq!(shifted, onset.identity);
        assert!((onset.frequency - 69.30).abs() < 0.01);
        assert!(tracker.is_active(shifted));
        assert!(!tracker.is_active(natural));
        assert_eq!(1, tracker.active_count());

        // And back again.
        let onset = tracker.step(key('A'), C2, true, false).unwrap();
        assert_eq!(natural, onset.identity);
        assert!(!tracker.is_active(shifted));
    }

    #[test]
    fn test_release_clears_both_identities() {
        let mut tracker = NoteTracker::new();

        tracker.step(key('A'), C2, true, true).unwrap();
        // Released while the modifier is up: the shifted note still goes away.
        tracker.step(key('A'), C2, false, false);
        assert_eq!(0, tracker.active_count());
    }

    #[test]
    fn test_shifted_press() {
        let mut tracker = NoteTracker::new();
        let onset = tracker.step(key('1'), C2, true, true).unwrap();
        assert!(onset.identity.shifted);
        assert!((onset.frequency - 69.30).abs() < 0.01);
    }

    #[test]
    fn test_tick_over_table() {
        let table = PitchTable::build(&parse_layout("ASDF"));
        let mut tracker = NoteTracker::new();
        let mut keyboard = ScriptedKeyboard::new(vec![
            Snapshot::held("AD"),
            Snapshot::held("AD"),
            Snapshot::held("DS"),
            Snapshot::held(""),
        ]);

        let mut tick = |tracker: &mut NoteTracker| {
            keyboard.refresh().unwrap();
            let shifted = keyboard.is_modifier_held();
            tracker.tick(&table, &keyboard, shifted)
        };

        let onsets = tick(&mut tracker);
        assert_eq!(
            vec![key('A'), key('D')],
            onsets.iter().map(|o| o.identity.key).collect::<Vec<_>>()
        );
        assert!((onsets[1].frequency - 82.41).abs() < 0.01);

        assert!(tick(&mut tracker).is_empty());

        let onsets = tick(&mut tracker);
        assert_eq!(1, onsets.len());
        assert_eq!(key('S'), onsets[0].identity.key);
        assert!(!tracker.is_active(NoteIdentity::new(key('A'), false)));
        assert_eq!(2, tracker.active_count());

        assert!(tick(&mut tracker).is_empty());
        assert_eq!(0, tracker.active_count());
    }

    #[test]
    fn test_identity_display() {
        assert_eq!("Q", NoteIdentity::new(key('q'), false).to_string());
        assert_eq!("Q#", NoteIdentity::new(key('q'), true).to_string());
    }
}
