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
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tracing::debug;

use super::{mixer::AudioMixer, AudioError, FrameSource};

/// A mock device. Mixes in memory and only produces audio when asked to render.
pub struct Device {
    name: String,
    mixer: Mutex<AudioMixer>,
    submitted: AtomicUsize,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(
        name: &str,
        sample_rate: u32,
        num_channels: u16,
        max_polyphony: Option<usize>,
    ) -> Device {
        Device {
            name: name.to_string(),
            mixer: Mutex::new(
                AudioMixer::new(num_channels, sample_rate).with_max_sources(max_polyphony),
            ),
            submitted: AtomicUsize::new(0),
        }
    }

    /// Pulls the given number of frames out of the mixer, as a sound card would.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut mixer = self.mixer.lock();
        let mut output = vec![0.0; frames * mixer.num_channels() as usize];
        mixer.process_into_output(&mut output);
        output
    }

    /// Returns how many sources have been handed to this device.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Returns how many sources are still playing.
    pub fn active_count(&self) -> usize {
        self.mixer.lock().active_count()
    }
}

impl super::Device for Device {
    fn play(&self, source: Box<dyn FrameSource>) -> Result<(), AudioError> {
        let id = self.mixer.lock().add_source(source);
        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(device = self.name, source = id, "Source added");
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.lock().sample_rate()
    }

    fn num_channels(&self) -> u16 {
        self.mixer.lock().num_channels()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
