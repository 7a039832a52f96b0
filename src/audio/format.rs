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
use std::{fmt, str::FromStr};

use super::AudioError;

/// Sample format of the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Integer samples (16 or 32 bit)
    Int,
    /// 32-bit floating point samples
    Float,
}

impl FromStr for SampleFormat {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float" | "Float" => Ok(SampleFormat::Float),
            "int" | "Int" => Ok(SampleFormat::Int),
            _ => Err(AudioError::UnsupportedFormat(format!(
                "unknown sample format {}",
                s
            ))),
        }
    }
}

impl SampleFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleFormat::Float => "float",
            SampleFormat::Int => "int",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The shape of the stream handed to the sound card.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Sample format (integer or float)
    pub sample_format: SampleFormat,
    /// Bits per sample
    pub bits_per_sample: u16,
}

impl OutputFormat {
    /// Creates a new OutputFormat, rejecting shapes the output cannot produce.
    pub fn new(
        sample_rate: u32,
        channels: u16,
        sample_format: SampleFormat,
        bits_per_sample: u16,
    ) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::UnsupportedFormat(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(AudioError::UnsupportedFormat(
                "there must be at least one channel".to_string(),
            ));
        }
        match (sample_format, bits_per_sample) {
            (SampleFormat::Float, 32) | (SampleFormat::Int, 16) | (SampleFormat::Int, 32) => {}
            (format, bits) => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{}-bit {} samples",
                    bits, format
                )))
            }
        }

        Ok(OutputFormat {
            sample_rate,
            channels,
            sample_format,
            bits_per_sample,
        })
    }
}

impl Default for OutputFormat {
    /// 44.1kHz stereo, 32-bit float
    fn default() -> Self {
        OutputFormat {
            sample_rate: 44100,
            channels: 2,
            sample_format: SampleFormat::Float,
            bits_per_sample: 32,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz, {} channels, {}-bit {}",
            self.sample_rate, self.channels, self.bits_per_sample, self.sample_format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format_from_str() {
        assert_eq!(
            SampleFormat::from_str("float").unwrap(),
            SampleFormat::Float
        );
        assert_eq!(
            SampleFormat::from_str("Float").unwrap(),
            SampleFormat::Float
        );
        assert_eq!(SampleFormat::from_str("int").unwrap(), SampleFormat::Int);
        assert_eq!(SampleFormat::from_str("Int").unwrap(), SampleFormat::Int);

        assert!(SampleFormat::from_str("invalid").is_err());
        assert!(SampleFormat::from_str("").is_err());
        assert!(SampleFormat::from_str("double").is_err());
    }

    #[test]
    fn test_sample_format_display() {
        assert_eq!(format!("{}", SampleFormat::Float), "float");
        assert_eq!(format!("{}", SampleFormat::Int), "int");
    }

    #[test]
    fn test_output_format_new() {
        let format = OutputFormat::new(48000, 2, SampleFormat::Int, 16).unwrap();
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_format, SampleFormat::Int);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!("48000Hz, 2 channels, 16-bit int", format.to_string());
    }

    #[test]
    fn test_output_format_new_invalid() {
        assert!(OutputFormat::new(0, 2, SampleFormat::Float, 32).is_err());
        assert!(OutputFormat::new(44100, 0, SampleFormat::Float, 32).is_err());
        assert!(OutputFormat::new(44100, 2, SampleFormat::Float, 16).is_err());
        assert!(OutputFormat::new(44100, 2, SampleFormat::Int, 24).is_err());
    }

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert_eq!(format, OutputFormat::new(44100, 2, SampleFormat::Float, 32).unwrap());
    }
}
