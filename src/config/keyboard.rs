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
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::{parse_duration, ConfigError};
use crate::pitch::{self, KeyCode, BASE_FREQUENCY, DEFAULT_LAYOUT};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Poll intervals above this make note onsets audibly late.
const MAX_RESPONSIVE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The playing surface configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Keyboard {
    /// The ordered playing keys, lowest pitch first. Whitespace is ignored.
    layout: Option<String>,

    /// The frequency of the first key in Hz.
    base_frequency: Option<f64>,

    /// How often the keyboard is sampled, e.g. "1ms".
    poll_interval: Option<String>,
}

impl Keyboard {
    pub fn layout(&self) -> &str {
        self.layout.as_deref().unwrap_or(DEFAULT_LAYOUT)
    }

    /// The playing keys in layout order.
    pub fn keys(&self) -> Vec<KeyCode> {
        pitch::parse_layout(self.layout())
    }

    pub fn base_frequency(&self) -> Result<f64, ConfigError> {
        let frequency = self.base_frequency.unwrap_or(BASE_FREQUENCY);
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "keyboard.base_frequency",
                reason: format!("{} is not a positive frequency", frequency),
            });
        }
        Ok(frequency)
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        let interval = match &self.poll_interval {
            Some(value) => parse_duration(value)?,
            None => DEFAULT_POLL_INTERVAL,
        };

        if interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "keyboard.poll_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if interval > MAX_RESPONSIVE_POLL_INTERVAL {
            warn!(
                poll_interval = ?interval,
                "Keyboard poll interval is long, note onsets may lag"
            );
        }
        Ok(interval)
    }
}
