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

//! Helpers shared by the unit tests.

use crate::audio::FrameSource;

/// A frame source that plays back a fixed buffer of interleaved samples.
pub struct MemorySource {
    samples: Vec<f32>,
    channels: u16,
    position: usize,
}

impl MemorySource {
    pub fn new(samples: Vec<f32>, channels: u16) -> MemorySource {
        MemorySource {
            samples,
            channels,
            position: 0,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frames(&mut self, output: &mut [f32]) -> usize {
        let channels = self.channels as usize;
        let remaining = (self.samples.len() - self.position) / channels;
        let frames = remaining.min(output.len() / channels);
        let samples = frames * channels;

        output[..samples].copy_from_slice(&self.samples[self.position..self.position + samples]);
        self.position += samples;
        frames
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }
}

/// Audio test utilities for validating synthesized signals
pub mod audio_test_utils {
    /// Calculate RMS (Root Mean Square) of a signal
    pub fn calculate_rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_squares: f32 = samples.iter().map(|&x| x * x).sum();
        (sum_squares / samples.len() as f32).sqrt()
    }

    /// Estimates the frequency of a mono signal by counting upward zero crossings.
    pub fn estimate_frequency(samples: &[f32], sample_rate: u32) -> f64 {
        let crossings: Vec<usize> = samples
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0] <= 0.0 && pair[1] > 0.0)
            .map(|(index, _)| index)
            .collect();

        if crossings.len() < 2 {
            return 0.0;
        }

        let periods = (crossings.len() - 1) as f64;
        let span = (crossings[crossings.len() - 1] - crossings[0]) as f64;
        periods * sample_rate as f64 / span
    }

    /// Takes every `channels`th sample starting at `channel`.
    pub fn channel(samples: &[f32], channels: u16, channel: usize) -> Vec<f32> {
        samples
            .iter()
            .skip(channel)
            .step_by(channels as usize)
            .copied()
            .collect()
    }
}
