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
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keypiano::audio;
use keypiano::config::Instrument;
use keypiano::engine::Engine;
use keypiano::feedback::TerminalFeedback;
use keypiano::keyboard::TerminalKeyboard;
use keypiano::pitch::{self, PitchTable};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sine-wave instrument played from the computer keyboard."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays the instrument until Esc is pressed.
    Play {
        /// The path to an instrument config file.
        #[arg[short, long]]
        config: Option<PathBuf>,
        /// The audio device to play through. Overrides the config file.
        #[arg[short, long]]
        device: Option<String>,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Prints the frequency of every playing key.
    Layout {
        /// The path to an instrument config file.
        #[arg[short, long]]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they stay out of the way of the note display.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { config, device } => {
            let mut instrument = Instrument::load(config.as_deref())?;
            if let Some(device) = device {
                instrument.audio_mut().set_device(&device);
            }
            play(&instrument)?;
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Layout { config } => {
            let instrument = Instrument::load(config.as_deref())?;
            let keyboard = instrument.keyboard();
            let table =
                PitchTable::with_base_frequency(&keyboard.keys(), keyboard.base_frequency()?);

            println!("Keys (count: {}):", table.len());
            for (key, frequency) in table.iter() {
                println!(
                    "- {}: {:.2} Hz (shifted {:.2} Hz)",
                    key,
                    frequency,
                    pitch::shift_semitone(frequency)
                );
            }
        }
    }

    Ok(())
}

/// Runs the instrument. The engine is dropped before returning, which restores the
/// terminal and stops the audio stream even when an error is returned.
fn play(instrument: &Instrument) -> Result<(), Box<dyn Error>> {
    let device = audio::get_device(instrument.audio())?;
    let mut engine = Engine::new(
        instrument,
        device,
        TerminalKeyboard::new()?,
        TerminalFeedback::stdout(),
    )?;

    engine.run()?;
    drop(engine);

    println!();
    Ok(())
}
