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

use super::{parse_duration, ConfigError};
use crate::synth::ToneSettings;

/// The shape shared by every tone.
#[derive(Deserialize, Clone, Default)]
pub struct Tone {
    /// Peak amplitude of a single tone.
    gain: Option<f32>,

    /// Total tone length, e.g. "1200ms".
    duration: Option<String>,

    /// Length of the closing linear fade, e.g. "700ms".
    fade_out: Option<String>,
}

impl Tone {
    /// Resolves and validates the tone settings.
    pub fn settings(&self) -> Result<ToneSettings, ConfigError> {
        let defaults = ToneSettings::default();

        let gain = self.gain.unwrap_or(defaults.gain);
        if !gain.is_finite() || gain <= 0.0 || gain > 1.0 {
            return Err(ConfigError::Invalid {
                field: "tone.gain",
                reason: format!("{} is not within (0, 1]", gain),
            });
        }

        let duration = match &self.duration {
            Some(value) => parse_duration(value)?,
            None => defaults.duration,
        };
        if duration.is_zero() {
            return Err(ConfigError::Invalid {
                field: "tone.duration",
                reason: "must be greater than zero".to_string(),
            });
        }

        let fade_out = match &self.fade_out {
            Some(value) => parse_duration(value)?,
            None => defaults.fade_out,
        };
        if fade_out > duration {
            return Err(ConfigError::Invalid {
                field: "tone.fade_out",
                reason: format!(
                    "{:?} is longer than the {:?} tone",
                    fade_out, duration
                ),
            });
        }

        Ok(ToneSettings {
            gain,
            duration,
            fade_out,
        })
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Tone {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_overrides() {
        let settings = parse("gain: 0.25\nduration: 500ms\nfade_out: 100ms\n")
            .settings()
            .unwrap();
        assert_eq!(0.25, settings.gain);
        assert_eq!(Duration::from_millis(500), settings.duration);
        assert_eq!(Duration::from_millis(100), settings.fade_out);
    }

    #[test]
    fn test_invalid_gain() {
        assert!(parse("gain: 1.5").settings().is_err());
        assert!(parse("gain: 0.0").settings().is_err());
    }

    #[test]
    fn test_zero_duration() {
        assert!(matches!(
            parse("duration: 0ms").settings(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_fade_longer_than_duration() {
        assert!(matches!(
            parse("duration: 100ms\nfade_out: 500ms\n").settings(),
            Err(ConfigError::Invalid {
                field: "tone.fade_out",
                ..
            })
        ));

        // The default fade is longer than a short tone too.
        assert!(parse("duration: 500ms").settings().is_err());

        let settings = parse("duration: 500ms\nfade_out: 500ms\n")
            .settings()
            .unwrap();
        assert_eq!(settings.duration, settings.fade_out);
    }
}
