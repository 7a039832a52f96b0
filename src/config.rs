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

//! Instrument configuration.
//!
//! Nothing here is required: every setting has a default, and can be overridden by
//! an optional YAML file and then by `KEYPIANO__SECTION__KEY` environment variables.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;

mod audio;
mod error;
mod keyboard;
mod tone;

pub use audio::Audio;
pub use error::ConfigError;
pub use keyboard::Keyboard;
pub use tone::Tone;

/// Prefix for environment overrides, e.g. KEYPIANO__AUDIO__DEVICE.
const ENV_PREFIX: &str = "KEYPIANO";

/// The full instrument configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Instrument {
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,
    /// The playing layout and polling configuration.
    #[serde(default)]
    keyboard: Keyboard,
    /// The shape of every tone.
    #[serde(default)]
    tone: Tone,
}

impl Instrument {
    /// Loads the configuration from the optional file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Instrument, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        Ok(builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize::<Instrument>()?)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Mutable access to the audio section, for command line overrides.
    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn tone(&self) -> &Tone {
        &self.tone
    }
}

/// Parses a duration string such as "700ms".
fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    DurationString::from_string(value.to_string())
        .map(Into::into)
        .map_err(|e| ConfigError::InvalidDuration {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use serial_test::serial;

    use super::*;
    use crate::pitch::{KeyCode, BASE_FREQUENCY, DEFAULT_LAYOUT};

    #[test]
    #[serial]
    fn test_defaults() {
        let instrument = Instrument::load(None).unwrap();

        assert_eq!(None, instrument.audio().device());
        assert_eq!(44100, instrument.audio().sample_rate());
        assert_eq!(2, instrument.audio().channels());
        assert_eq!(None, instrument.audio().max_polyphony());

        assert_eq!(DEFAULT_LAYOUT, instrument.keyboard().layout());
        assert_eq!(BASE_FREQUENCY, instrument.keyboard().base_frequency().unwrap());
        assert_eq!(
            Duration::from_millis(1),
            instrument.keyboard().poll_interval().unwrap()
        );

        let tone = instrument.tone().settings().unwrap();
        assert_eq!(0.18, tone.gain);
        assert_eq!(Duration::from_millis(1200), tone.duration);
        assert_eq!(Duration::from_millis(700), tone.fade_out);
    }

    #[test]
    #[serial]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
audio:
  device: mock-device
  sample_rate: 48000
  max_polyphony: 16
keyboard:
  layout: "ASDFGHJ KL"
  poll_interval: 2ms
tone:
  gain: 0.1
  duration: 2s
"#
        )
        .unwrap();

        let instrument = Instrument::load(Some(file.path())).unwrap();
        assert_eq!(Some("mock-device"), instrument.audio().device());
        assert_eq!(48000, instrument.audio().sample_rate());
        assert_eq!(Some(16), instrument.audio().max_polyphony());

        let keys = instrument.keyboard().keys();
        assert_eq!(9, keys.len());
        assert_eq!(KeyCode::from_char('L'), keys[8]);
        assert_eq!(
            Duration::from_millis(2),
            instrument.keyboard().poll_interval().unwrap()
        );

        let tone = instrument.tone().settings().unwrap();
        assert_eq!(0.1, tone.gain);
        assert_eq!(Duration::from_secs(2), tone.duration);
        assert_eq!(Duration::from_millis(700), tone.fade_out);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "audio:\n  device: from-file\n  sample_rate: 48000\n").unwrap();

        std::env::set_var("KEYPIANO__AUDIO__DEVICE", "from-env");
        let result = Instrument::load(Some(file.path()));
        std::env::remove_var("KEYPIANO__AUDIO__DEVICE");

        let instrument = result.unwrap();
        assert_eq!(Some("from-env"), instrument.audio().device());
        assert_eq!(48000, instrument.audio().sample_rate());
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let result = Instrument::load(Some(Path::new("/nonexistent/keypiano.yaml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(Duration::from_millis(5), parse_duration("5ms").unwrap());
        assert!(matches!(
            parse_duration("soon"),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }
}
