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
// Core mixing logic shared by the cpal output and the mock device.
use tracing::warn;

use super::FrameSource;

/// Number of frames the scratch buffer is sized for up front.
const INITIAL_BLOCK_FRAMES: usize = 4096;

/// Sums every playing source into one interleaved output stream.
///
/// The mixer is owned by whichever context pulls audio out of it. Sources that run
/// out are dropped from the set during the pull that exhausts them.
pub struct AudioMixer {
    /// Sources currently playing, oldest first.
    sources: Vec<ActiveSource>,
    /// Number of output channels
    num_channels: u16,
    /// Sample rate
    sample_rate: u32,
    /// Optional cap on simultaneous sources.
    max_sources: Option<usize>,
    /// Reused per-source render buffer.
    scratch: Vec<f32>,
    /// ID handed to the next source.
    next_id: u64,
}

/// A source in the mixer.
struct ActiveSource {
    id: u64,
    source: Box<dyn FrameSource>,
}

impl AudioMixer {
    /// Creates a new audio mixer with no polyphony limit.
    pub fn new(num_channels: u16, sample_rate: u32) -> Self {
        Self {
            sources: Vec::new(),
            num_channels,
            sample_rate,
            max_sources: None,
            scratch: vec![0.0; INITIAL_BLOCK_FRAMES * num_channels as usize],
            next_id: 1,
        }
    }

    /// Limits the number of sources that may play at once. When the limit is reached,
    /// adding a source steals the oldest one.
    pub fn with_max_sources(mut self, max_sources: Option<usize>) -> Self {
        self.max_sources = max_sources.filter(|max| *max > 0);
        self
    }

    /// Adds a new source to the mixer. Returns the ID assigned to it, or None if the
    /// source does not match the mixer's channel layout.
    pub fn add_source(&mut self, source: Box<dyn FrameSource>) -> Option<u64> {
        if source.channel_count() != self.num_channels {
            warn!(
                source_channels = source.channel_count(),
                mixer_channels = self.num_channels,
                "Dropping source with mismatched channel count"
            );
            return None;
        }

        if let Some(max_sources) = self.max_sources {
            if self.sources.len() >= max_sources {
                let stolen = self.sources.remove(0);
                warn!(
                    max_sources,
                    stolen = stolen.id,
                    "Polyphony limit reached, stealing oldest"
                );
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.sources.push(ActiveSource { id, source });
        Some(id)
    }

    /// Mixes the next block into `output`, which holds interleaved frames for every
    /// output channel. Sources that end inside the block contribute silence for the
    /// rest of it and are removed.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        let channels = self.num_channels as usize;
        let frames = output.len() / channels;
        let samples = frames * channels;

        output.fill(0.0);
        if self.scratch.len() < samples {
            self.scratch.resize(samples, 0.0);
        }

        let AudioMixer {
            sources, scratch, ..
        } = self;
        let scratch = &mut scratch[..samples];

        sources.retain_mut(|active| {
            let written = active.source.next_frames(scratch).min(frames);
            let written_samples = written * channels;

            for (out, sample) in output[..written_samples]
                .iter_mut()
                .zip(&scratch[..written_samples])
            {
                *out += sample;
            }

            written == frames
        });
    }

    /// Returns the number of sources still playing.
    pub fn active_count(&self) -> usize {
        self.sources.len()
    }

    /// Gets the number of output channels
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Gets the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
