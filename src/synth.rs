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

//! Sine tone synthesis.
//!
//! Every onset becomes a [`Tone`]: a sine wave of fixed length that starts at full
//! level and fades linearly to silence over its tail. Tones know nothing about keys,
//! so releasing a key never cuts one short.

use std::f64::consts::TAU;
use std::time::Duration;

use crate::audio::FrameSource;

const DEFAULT_GAIN: f32 = 0.18;
const DEFAULT_DURATION: Duration = Duration::from_millis(1200);
const DEFAULT_FADE_OUT: Duration = Duration::from_millis(700);

/// The shape shared by every tone.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSettings {
    /// Peak amplitude, as a fraction of full scale.
    pub gain: f32,
    /// Total length of a tone.
    pub duration: Duration,
    /// Length of the fade at the end of the tone. Never longer than `duration`.
    pub fade_out: Duration,
}

impl Default for ToneSettings {
    fn default() -> Self {
        ToneSettings {
            gain: DEFAULT_GAIN,
            duration: DEFAULT_DURATION,
            fade_out: DEFAULT_FADE_OUT,
        }
    }
}

/// Builds tones for a particular output format.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    gain: f32,
    total_frames: usize,
    fade_frames: usize,
    sample_rate: u32,
    channels: u16,
}

impl ToneSynthesizer {
    pub fn new(settings: &ToneSettings, sample_rate: u32, channels: u16) -> ToneSynthesizer {
        let total_frames = frames_for(settings.duration, sample_rate);
        let fade_frames = frames_for(settings.fade_out, sample_rate).min(total_frames);

        ToneSynthesizer {
            gain: settings.gain,
            total_frames,
            fade_frames,
            sample_rate,
            channels,
        }
    }

    /// Creates a tone at the given frequency.
    pub fn synthesize(&self, frequency: f64) -> Tone {
        Tone {
            frequency,
            gain: self.gain,
            sample_rate: self.sample_rate,
            channels: self.channels,
            position: 0,
            total_frames: self.total_frames,
            fade_frames: self.fade_frames,
        }
    }
}

fn frames_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

/// A single fixed-length sine tone. The same sample is written to every channel.
#[derive(Debug, Clone)]
pub struct Tone {
    frequency: f64,
    gain: f32,
    sample_rate: u32,
    channels: u16,
    /// Next frame to render.
    position: usize,
    total_frames: usize,
    fade_frames: usize,
}

impl Tone {
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Returns the full length of the tone in frames.
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Returns how many frames are left to play.
    pub fn remaining_frames(&self) -> usize {
        self.total_frames - self.position
    }

    /// Amplitude multiplier at the given frame: flat, then a linear ramp that lands on
    /// zero at the last frame.
    fn envelope(&self, frame: usize) -> f32 {
        let fade_start = self.total_frames - self.fade_frames;
        if frame < fade_start {
            1.0
        } else {
            (self.total_frames - 1 - frame) as f32 / self.fade_frames as f32
        }
    }

    fn sample(&self, frame: usize) -> f32 {
        // Phase from the absolute frame index so long tones don't drift.
        let phase = (frame as f64 * self.frequency / self.sample_rate as f64).fract();
        (TAU * phase).sin() as f32 * self.gain * self.envelope(frame)
    }
}

impl FrameSource for Tone {
    fn next_frames(&mut self, output: &mut [f32]) -> usize {
        let channels = self.channels as usize;
        let frames = (output.len() / channels).min(self.remaining_frames());

        for (offset, frame) in output.chunks_exact_mut(channels).take(frames).enumerate() {
            frame.fill(self.sample(self.position + offset));
        }

        self.position += frames;
        frames
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }
}
