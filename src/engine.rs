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

//! The polling loop that turns key presses into tones.

use std::{io, sync::Arc, time::Duration};

use tracing::{debug, info, span, Level};

use crate::audio::{AudioError, Device};
use crate::config::{self, ConfigError};
use crate::feedback::Feedback;
use crate::keyboard::{KeySampler, KeyboardError};
use crate::notes::NoteTracker;
use crate::pitch::PitchTable;
use crate::synth::ToneSynthesizer;

/// Errors that stop the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("keyboard error: {0}")]
    Keyboard(#[from] KeyboardError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("feedback error: {0}")]
    Feedback(#[from] io::Error),
}

/// Whether the engine should keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Exit,
}

/// Owns everything the polling loop touches.
///
/// Fields drop in order, so the sampler (and with it the terminal) is released before
/// the device stops its stream.
pub struct Engine<K: KeySampler, F: Feedback> {
    sampler: K,
    feedback: F,
    table: PitchTable,
    tracker: NoteTracker,
    synth: ToneSynthesizer,
    device: Arc<dyn Device>,
    poll_interval: Duration,
}

impl<K: KeySampler, F: Feedback> Engine<K, F> {
    /// Builds the pitch table and synthesizer from the configuration. Tones are shaped
    /// to the device's sample rate and channel count.
    pub fn new(
        instrument: &config::Instrument,
        device: Arc<dyn Device>,
        sampler: K,
        feedback: F,
    ) -> Result<Engine<K, F>, EngineError> {
        let keyboard = instrument.keyboard();
        let table =
            PitchTable::with_base_frequency(&keyboard.keys(), keyboard.base_frequency()?);
        let synth = ToneSynthesizer::new(
            &instrument.tone().settings()?,
            device.sample_rate(),
            device.num_channels(),
        );

        Ok(Engine {
            sampler,
            feedback,
            table,
            tracker: NoteTracker::new(),
            synth,
            device,
            poll_interval: keyboard.poll_interval()?,
        })
    }

    /// Runs one polling pass over the keyboard.
    pub fn tick(&mut self) -> Result<EngineState, EngineError> {
        self.sampler.refresh()?;
        if self.sampler.is_exit_requested() {
            return Ok(EngineState::Exit);
        }

        let shifted = self.sampler.is_modifier_held();
        for onset in self.tracker.tick(&self.table, &self.sampler, shifted) {
            debug!(
                key = %onset.identity.key,
                shifted = onset.identity.shifted,
                frequency = onset.frequency,
                "Note on"
            );
            self.device
                .play(Box::new(self.synth.synthesize(onset.frequency)))?;
            self.feedback.note_on(&onset)?;
        }

        Ok(EngineState::Running)
    }

    /// Polls until the exit key is pressed.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let span = span!(Level::INFO, "engine");
        let _enter = span.enter();

        self.feedback.banner(self.table.len())?;
        info!(
            keys = self.table.len(),
            poll_interval = ?self.poll_interval,
            device = %self.device,
            "Engine started."
        );

        while self.tick()? == EngineState::Running {
            spin_sleep::sleep(self.poll_interval);
        }

        info!(held = self.tracker.active_count(), "Engine stopped.");
        Ok(())
    }

    pub fn table(&self) -> &PitchTable {
        &self.table
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn sampler(&self) -> &K {
        &self.sampler
    }
}
