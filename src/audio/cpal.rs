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
use std::{fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use super::{
    mixer::AudioMixer, thread_priority::CallbackPriority, AudioError, FrameSource, OutputFormat,
    SampleFormat,
};
use crate::config;

/// A short description of an output device, for listing.
pub struct DeviceInfo {
    /// The name of the device.
    pub name: String,
    /// The host the device belongs to.
    pub host: String,
    /// The maximum number of channels the device supports.
    pub max_channels: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// A continuously running cpal output stream fed by a mixer.
///
/// The stream lives on its own thread, since cpal streams can't move between threads
/// on every platform. Sources reach the mixer through a channel that the audio
/// callback drains before each block. Dropping the device stops the stream.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The format of the running stream.
    format: OutputFormat,
    /// Channel for handing new sources to the audio callback.
    source_tx: Sender<Box<dyn FrameSource>>,
    /// Dropping this tells the output thread to stop the stream.
    shutdown_tx: Option<Sender<()>>,
    /// Handle to the output thread (keeps the stream alive).
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) ({})",
            self.name,
            self.format,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal output devices across all available hosts.
    pub fn list() -> Result<Vec<DeviceInfo>, AudioError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<DeviceInfo> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(DeviceInfo {
                        name: device.name()?,
                        host: host_id.name().to_string(),
                        max_channels,
                    });
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Finds the configured device and starts streaming to it.
    pub fn get(config: &config::Audio) -> Result<Device, AudioError> {
        let format = OutputFormat::new(
            config.sample_rate(),
            config.channels(),
            config.sample_format()?,
            config.bits_per_sample(),
        )?;
        let (host_id, device) = Device::find(config.device())?;
        let name = device.name()?;

        let stream_config = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: match config.stream_buffer_size() {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };
        let mixer = AudioMixer::new(format.channels, format.sample_rate)
            .with_max_sources(config.max_polyphony());

        let (source_tx, source_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let output_thread = start_output_thread(
            device,
            stream_config,
            format.clone(),
            mixer,
            source_rx,
            shutdown_rx,
        )?;

        info!(device = name, format = format.to_string(), "Audio output started.");

        Ok(Device {
            name,
            host_id,
            format,
            source_tx,
            shutdown_tx: Some(shutdown_tx),
            output_thread: Some(output_thread),
        })
    }

    /// Finds an output device by name, or the default output device when no name
    /// (or "default") is given.
    fn find(name: Option<&str>) -> Result<(cpal::HostId, cpal::Device), AudioError> {
        let host = cpal::default_host();
        let name = match name {
            None | Some("default") => {
                let device = host
                    .default_output_device()
                    .ok_or(AudioError::NoDefaultDevice)?;
                return Ok((host.id(), device));
            }
            Some(name) => name,
        };

        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        for host_id in cpal::available_hosts() {
            let Ok(devices) = cpal::host_from_id(host_id)?.output_devices() else {
                continue;
            };
            for device in devices {
                if device.name().is_ok_and(|device_name| device_name.trim() == name) {
                    return Ok((host_id, device));
                }
            }
        }

        Err(AudioError::DeviceNotFound(name.to_string()))
    }
}

/// Starts the thread that owns the cpal stream. Returns once the stream is playing,
/// or with the error that kept it from starting.
fn start_output_thread(
    device: cpal::Device,
    stream_config: cpal::StreamConfig,
    format: OutputFormat,
    mixer: AudioMixer,
    source_rx: Receiver<Box<dyn FrameSource>>,
    shutdown_rx: Receiver<()>,
) -> Result<thread::JoinHandle<()>, AudioError> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), AudioError>>(1);

    let output_thread = thread::Builder::new()
        .name("keypiano-output".to_string())
        .spawn(move || {
            let span = span!(Level::INFO, "audio output");
            let _enter = span.enter();

            let stream = match build_stream(&device, &stream_config, &format, mixer, source_rx)
                .and_then(|stream| {
                    stream.play()?;
                    Ok(stream)
                }) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            // Blocks until the device is dropped.
            let _ = shutdown_rx.recv();
            drop(stream);
            info!("Audio output stopped.");
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(output_thread),
        Ok(Err(e)) => {
            let _ = output_thread.join();
            Err(e)
        }
        Err(_) => {
            let _ = output_thread.join();
            Err(AudioError::OutputThread)
        }
    }
}

/// Builds a stream in the requested sample format.
fn build_stream(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    format: &OutputFormat,
    mixer: AudioMixer,
    source_rx: Receiver<Box<dyn FrameSource>>,
) -> Result<cpal::Stream, AudioError> {
    match (format.sample_format, format.bits_per_sample) {
        (SampleFormat::Float, 32) => {
            build_typed_stream::<f32>(device, stream_config, mixer, source_rx)
        }
        (SampleFormat::Int, 16) => build_typed_stream::<i16>(device, stream_config, mixer, source_rx),
        (SampleFormat::Int, 32) => build_typed_stream::<i32>(device, stream_config, mixer, source_rx),
        _ => Err(AudioError::UnsupportedFormat(format.to_string())),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    mixer: AudioMixer,
    source_rx: Receiver<Box<dyn FrameSource>>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let stream = device.build_output_stream(
        stream_config,
        create_callback::<T>(mixer, source_rx),
        |err| error!(err = err.to_string(), "CPAL output stream error"),
        None,
    )?;
    Ok(stream)
}

/// Creates the audio callback.
fn create_callback<T>(
    mut mixer: AudioMixer,
    source_rx: Receiver<Box<dyn FrameSource>>,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut priority = CallbackPriority::from_env();
    let mut mixed: Vec<f32> = Vec::new();

    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        priority.apply_once();
        render(&mut mixer, &source_rx, &mut mixed, data);
    }
}

/// Fills one device buffer: pick up newly submitted sources, mix, then convert into
/// the device's sample type.
fn render<T>(
    mixer: &mut AudioMixer,
    source_rx: &Receiver<Box<dyn FrameSource>>,
    mixed: &mut Vec<f32>,
    data: &mut [T],
) where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    while let Ok(source) = source_rx.try_recv() {
        mixer.add_source(source);
    }

    // Only grows on the first callback or when the host changes its buffer size.
    if mixed.len() != data.len() {
        mixed.resize(data.len(), 0.0);
    }
    mixer.process_into_output(mixed);

    for (dst, &src) in data.iter_mut().zip(mixed.iter()) {
        *dst = T::from_sample(src);
    }
}

impl super::Device for Device {
    fn play(&self, source: Box<dyn FrameSource>) -> Result<(), AudioError> {
        self.source_tx
            .send(source)
            .map_err(|_| AudioError::Disconnected)
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn num_channels(&self) -> u16 {
        self.format.channels
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // Closing the shutdown channel wakes the output thread.
        self.shutdown_tx.take();
        if let Some(output_thread) = self.output_thread.take() {
            if output_thread.join().is_err() {
                error!("Audio output thread panicked");
            }
        }
    }
}
