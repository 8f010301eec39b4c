//! Sound engines
//!
//! One engine per sound mode. Every engine ingests the angle/velocity
//! signal each update tick, sets target gain and rate from it, and ramps
//! the current values toward those targets with the exponential filter.
//! The current values are what drives playback.

mod creak;
mod theremin;
mod triggered;

pub use creak::CreakEngine;
pub use theremin::ThereminEngine;
pub use triggered::TriggeredEngine;

use crate::config::ModesConfig;
use crate::mapping::Smoother;
use crate::synth::SampleBank;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The available sound modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundMode {
    /// No sound engine active
    Off,
    /// Looped creak sample, gain and rate from hinge speed
    Creak,
    /// Continuous tone, pitch from lid angle
    Theremin,
    /// Continuous tone, pitch from angle, gain gated by motion
    ThereminMotion,
    /// One-shot sample bank triggered by fast motion, rate-stretched
    Gachi,
    /// One-shot sample bank triggered by fast motion
    Anime,
    /// One-shot bank of system alert sounds
    SystemSounds,
}

impl SoundMode {
    /// All modes in menu order
    pub fn all() -> &'static [SoundMode] {
        &[
            SoundMode::Off,
            SoundMode::Creak,
            SoundMode::Theremin,
            SoundMode::ThereminMotion,
            SoundMode::Gachi,
            SoundMode::Anime,
            SoundMode::SystemSounds,
        ]
    }

    /// Stable identifier used in config files
    pub fn name(&self) -> &'static str {
        match self {
            SoundMode::Off => "off",
            SoundMode::Creak => "creak",
            SoundMode::Theremin => "theremin",
            SoundMode::ThereminMotion => "theremin_motion",
            SoundMode::Gachi => "gachi",
            SoundMode::Anime => "anime",
            SoundMode::SystemSounds => "system_sounds",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            SoundMode::Off => "Off",
            SoundMode::Creak => "Creak",
            SoundMode::Theremin => "Theremin",
            SoundMode::ThereminMotion => "Theremin (motion)",
            SoundMode::Gachi => "Gachi",
            SoundMode::Anime => "Anime",
            SoundMode::SystemSounds => "System Sounds",
        }
    }

    /// Look up a mode by its config identifier
    pub fn from_name(name: &str) -> Option<SoundMode> {
        Self::all().iter().copied().find(|m| m.name() == name)
    }

    /// Whether this mode plays discrete tracks that can be pinned
    pub fn is_track_based(&self) -> bool {
        matches!(
            self,
            SoundMode::Gachi | SoundMode::Anime | SoundMode::SystemSounds
        )
    }

    /// The mode after this one, wrapping around (TUI mode cycling)
    pub fn next(&self) -> SoundMode {
        let all = Self::all();
        let idx = all.iter().position(|m| m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

/// Trait for sound engines
pub trait SoundEngine: Send {
    /// Which mode this engine implements
    fn mode(&self) -> SoundMode;

    /// Start the engine (enables the update and playback path)
    fn start(&mut self) -> Result<()>;

    /// Stop the engine
    fn stop(&mut self);

    /// Check if the engine is running
    fn is_running(&self) -> bool;

    /// Ingest the latest signal and advance the parameter ramps.
    ///
    /// `angle` in degrees, `velocity` in degrees/second, `dt` seconds
    /// since the previous tick.
    fn update(&mut self, angle: f64, velocity: f64, dt: f64);

    /// Generate the next mono output sample
    fn process(&mut self) -> f64;

    /// Current (smoothed) gain
    fn current_gain(&self) -> f64;

    /// Current (smoothed) playback rate
    fn current_rate(&self) -> f64;

    /// Pin a specific track. Returns false for out-of-range indices and
    /// for engines without tracks.
    fn select_track(&mut self, _index: usize) -> bool {
        false
    }

    /// Clear any pinned track, reverting to random selection
    fn reset_track(&mut self) {}

    /// Track names for display, empty for non-track engines
    fn track_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Index of the most recently fired track, for feedback outputs
    fn last_triggered_track(&self) -> Option<usize> {
        None
    }
}

/// The ramped parameter pair shared by every engine
pub struct EngineParams {
    gain: Smoother,
    rate: Smoother,
    running: bool,
}

impl EngineParams {
    /// Create params at silence and unity rate
    pub fn new(gain_tau_ms: f64, rate_tau_ms: f64) -> Self {
        Self {
            gain: Smoother::new(0.0, gain_tau_ms),
            rate: Smoother::new(1.0, rate_tau_ms),
            running: false,
        }
    }

    /// Set the targets the ramps chase
    pub fn set_targets(&mut self, gain: f64, rate: f64) {
        self.gain.set_target(gain);
        self.rate.set_target(rate);
    }

    /// Advance both ramps by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        self.gain.tick(dt);
        self.rate.tick(dt);
    }

    pub fn gain(&self) -> f64 {
        self.gain.value()
    }

    pub fn rate(&self) -> f64 {
        self.rate.value()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Enable the update path
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Disable the update path and cut gain so a restart fades in fresh
    pub fn stop(&mut self) {
        self.running = false;
        self.gain.snap(0.0);
    }
}

/// Build the engine for a mode from config. `Off` has no engine.
pub fn build_engine(
    mode: SoundMode,
    config: &ModesConfig,
    sample_rate: f64,
) -> Option<Box<dyn SoundEngine>> {
    match mode {
        SoundMode::Off => None,
        SoundMode::Creak => Some(Box::new(CreakEngine::new(&config.creak, sample_rate))),
        SoundMode::Theremin => Some(Box::new(ThereminEngine::new(
            &config.theremin,
            sample_rate,
            false,
        ))),
        SoundMode::ThereminMotion => Some(Box::new(ThereminEngine::new(
            &config.theremin,
            sample_rate,
            true,
        ))),
        SoundMode::Gachi => {
            let bank = SampleBank::load_dir(&config.gachi.dir);
            Some(Box::new(TriggeredEngine::new(
                SoundMode::Gachi,
                bank,
                &config.gachi,
                sample_rate,
            )))
        }
        SoundMode::Anime => {
            let bank = SampleBank::load_dir(&config.anime.dir);
            Some(Box::new(TriggeredEngine::new(
                SoundMode::Anime,
                bank,
                &config.anime,
                sample_rate,
            )))
        }
        SoundMode::SystemSounds => {
            let bank = SampleBank::load_dir(&config.system_sounds.dir);
            Some(Box::new(TriggeredEngine::new(
                SoundMode::SystemSounds,
                bank,
                &config.system_sounds,
                sample_rate,
            )))
        }
    }
}
