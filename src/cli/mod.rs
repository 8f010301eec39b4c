//! CLI interface for Hinge

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Laptop lid sonification - angle and hinge speed become sound
#[derive(Parser)]
#[command(name = "hinge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play the lid signal through the audio output
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "hinge.yaml")]
        config: PathBuf,

        /// Override the startup sound mode (off, creak, theremin, ...)
        #[arg(short, long)]
        mode: Option<String>,

        /// Mirror the signal onto a MIDI output port
        #[arg(long)]
        midi: bool,

        /// MIDI port to use with --midi (default: first available)
        #[arg(long, value_name = "PORT")]
        midi_port: Option<String>,
    },

    /// Render a simulated lid sweep to a WAV file
    Record {
        /// Configuration file path
        #[arg(short, long, default_value = "hinge.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "30")]
        duration: u64,
    },

    /// Live TUI with meters and mode/track/volume controls
    Monitor {
        /// Configuration file path
        #[arg(short, long, default_value = "hinge.yaml")]
        config: PathBuf,
    },

    /// List available audio and MIDI output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "hinge.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
