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
use std::collections::{HashSet, VecDeque};

use crate::pitch::KeyCode;

use super::{KeySampler, KeyboardError};

/// One tick's worth of keyboard state.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    held: HashSet<KeyCode>,
    modifier: bool,
    exit: bool,
}

impl Snapshot {
    /// A snapshot with the given keys held.
    pub fn held(keys: &str) -> Snapshot {
        Snapshot {
            held: keys.chars().map(KeyCode::from_char).collect(),
            ..Default::default()
        }
    }

    /// Holds the modifier in this snapshot.
    pub fn shifted(mut self) -> Snapshot {
        self.modifier = true;
        self
    }

    /// A snapshot with the exit key held.
    pub fn exit() -> Snapshot {
        Snapshot::default().and_exit()
    }

    /// Holds the exit key in this snapshot as well.
    pub fn and_exit(mut self) -> Snapshot {
        self.exit = true;
        self
    }
}

/// A keyboard that replays a script, one snapshot per refresh. Once the script
/// runs out, all keys read as released.
pub struct ScriptedKeyboard {
    script: VecDeque<Snapshot>,
    current: Snapshot,
}

impl ScriptedKeyboard {
    pub fn new(script: Vec<Snapshot>) -> ScriptedKeyboard {
        ScriptedKeyboard {
            script: script.into(),
            current: Snapshot::default(),
        }
    }

    /// Returns true if every snapshot has been consumed.
    pub fn is_finished(&self) -> bool {
        self.script.is_empty()
    }
}

impl KeySampler for ScriptedKeyboard {
    fn refresh(&mut self) -> Result<(), KeyboardError> {
        self.current = self.script.pop_front().unwrap_or_default();
        Ok(())
    }

    fn is_held(&self, key: KeyCode) -> bool {
        self.current.held.contains(&key)
    }

    fn is_modifier_held(&self) -> bool {
        self.current.modifier
    }

    fn is_exit_requested(&self) -> bool {
        self.current.exit
    }
}
