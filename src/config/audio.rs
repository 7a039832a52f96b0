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
use serde::Deserialize;

use crate::audio::{AudioError, SampleFormat};

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHANNELS: u16 = 2;
const DEFAULT_BITS_PER_SAMPLE: u16 = 32;

/// A YAML representation of the audio output configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Audio {
    /// The output device name. The host's default output device is used if unset.
    device: Option<String>,

    /// The output sample rate in Hz.
    sample_rate: Option<u32>,

    /// The number of output channels. Every channel carries the same signal.
    channels: Option<u16>,

    /// The output sample format ("int" or "float").
    sample_format: Option<String>,

    /// The output bit depth.
    bits_per_sample: Option<u16>,

    /// Requested stream buffer size in frames. The host default is used if unset.
    stream_buffer_size: Option<u32>,

    /// Maximum number of tones that may sound at once. Unbounded if unset.
    max_polyphony: Option<usize>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: Option<&str>) -> Audio {
        Audio {
            device: device.map(str::to_string),
            ..Default::default()
        }
    }

    /// Sets the polyphony cap.
    pub fn with_max_polyphony(mut self, max_polyphony: Option<usize>) -> Audio {
        self.max_polyphony = max_polyphony;
        self
    }

    /// Overrides the output device.
    pub fn set_device(&mut self, device: &str) {
        self.device = Some(device.to_string());
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn channels(&self) -> u16 {
        self.channels.unwrap_or(DEFAULT_CHANNELS)
    }

    /// The output sample format, defaulting to float.
    pub fn sample_format(&self) -> Result<SampleFormat, AudioError> {
        match &self.sample_format {
            Some(format) => format.parse(),
            None => Ok(SampleFormat::Float),
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample.unwrap_or(DEFAULT_BITS_PER_SAMPLE)
    }

    pub fn stream_buffer_size(&self) -> Option<u32> {
        self.stream_buffer_size
    }

    pub fn max_polyphony(&self) -> Option<usize> {
        self.max_polyphony
    }
}

#[cfg(test)]
mod test {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_defaults() {
        let audio = Audio::new(None);
        assert_eq!(None, audio.device());
        assert_eq!(44100, audio.sample_rate());
        assert_eq!(2, audio.channels());
        assert_eq!(SampleFormat::Float, audio.sample_format().unwrap());
        assert_eq!(32, audio.bits_per_sample());
        assert_eq!(None, audio.stream_buffer_size());
        assert_eq!(None, audio.max_polyphony());
    }

    #[test]
    fn test_deserialize() {
        let audio: Audio = Config::builder()
            .add_source(File::from_str(
                r#"
device: "USB Audio"
sample_rate: 48000
channels: 1
sample_format: int
bits_per_sample: 16
stream_buffer_size: 256
max_polyphony: 12
"#,
                FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(Some("USB Audio"), audio.device());
        assert_eq!(48000, audio.sample_rate());
        assert_eq!(1, audio.channels());
        assert_eq!(SampleFormat::Int, audio.sample_format().unwrap());
        assert_eq!(16, audio.bits_per_sample());
        assert_eq!(Some(256), audio.stream_buffer_size());
        assert_eq!(Some(12), audio.max_polyphony());
    }

    #[test]
    fn test_bad_sample_format() {
        let audio: Audio = Config::builder()
            .add_source(File::from_str("sample_format: double", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(audio.sample_format().is_err());
    }

    #[test]
    fn test_device_override() {
        let mut audio = Audio::new(Some("first"));
        audio.set_device("second");
        assert_eq!(Some("second"), audio.device());
    }
}
