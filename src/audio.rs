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
use std::{fmt, io, sync::Arc};

use crate::config;

pub mod cpal;
pub mod format;
pub mod mixer;
pub mod mock;
mod thread_priority;

pub use format::{OutputFormat, SampleFormat};

/// Errors raised by audio output.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no default output device available")]
    NoDefaultDevice,

    #[error("no device found with name {0}")]
    DeviceNotFound(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("unable to reach audio host: {0}")]
    Host(#[from] ::cpal::HostUnavailable),

    #[error("unable to list devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("unable to read device name: {0}")]
    DeviceName(#[from] ::cpal::DeviceNameError),

    #[error("unable to read device configurations: {0}")]
    SupportedConfigs(#[from] ::cpal::SupportedStreamConfigsError),

    #[error("unable to build output stream: {0}")]
    BuildStream(#[from] ::cpal::BuildStreamError),

    #[error("unable to start output stream: {0}")]
    PlayStream(#[from] ::cpal::PlayStreamError),

    #[error("output thread exited before the stream started")]
    OutputThread,

    #[error("audio output has shut down")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A finite stream of interleaved frames, such as a synthesized tone.
pub trait FrameSource: Send {
    /// Writes up to `output.len() / channel_count()` frames of interleaved samples
    /// into `output` and returns how many frames were written. Writing fewer frames
    /// than requested means the source is exhausted.
    fn next_frames(&mut self, output: &mut [f32]) -> usize;

    /// The number of interleaved channels this source produces.
    fn channel_count(&self) -> u16;
}

/// An output that plays frame sources, mixing everything submitted to it.
pub trait Device: fmt::Display + Send + Sync {
    /// Hands a source to the output. It plays until it is exhausted.
    fn play(&self, source: Box<dyn FrameSource>) -> Result<(), AudioError>;

    /// The output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// The number of interleaved output channels.
    fn num_channels(&self) -> u16;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, AudioError> {
    cpal::Device::list()
}

/// Opens the device named by the configuration. Names starting with "mock" produce a
/// device that mixes in memory and never touches the sound card.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, AudioError> {
    if let Some(name) = config.device().filter(|name| name.starts_with("mock")) {
        let format = OutputFormat::new(
            config.sample_rate(),
            config.channels(),
            config.sample_format()?,
            config.bits_per_sample(),
        )?;
        return Ok(Arc::new(mock::Device::get(
            name,
            format.sample_rate,
            format.channels,
            config.max_polyphony(),
        )));
    }

    Ok(Arc::new(cpal::Device::get(config)?))
}
