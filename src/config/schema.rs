//! Configuration schema definitions

use crate::modes::SoundMode;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration for Hinge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HingeConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Master settings (volume, startup mode, velocity smoothing)
    #[serde(default)]
    pub master: MasterConfig,

    /// Lid-angle sensor settings
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Per-mode engine settings
    #[serde(default)]
    pub modes: ModesConfig,
}

impl HingeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if SoundMode::from_name(&self.master.mode).is_none() {
            bail!(
                "Unknown sound mode '{}' (expected one of: {})",
                self.master.mode,
                SoundMode::all()
                    .iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if self.master.velocity_tau_ms < 0.0 {
            bail!("Velocity smoothing tau must not be negative");
        }

        self.modes.creak.validate()?;
        self.modes.theremin.validate()?;
        self.modes.gachi.validate("gachi")?;
        self.modes.anime.validate("anime")?;
        self.modes.system_sounds.validate("system_sounds")?;

        Ok(())
    }

    /// The configured startup mode
    pub fn startup_mode(&self) -> SoundMode {
        SoundMode::from_name(&self.master.mode).unwrap_or(SoundMode::Off)
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

fn default_sample_rate() -> u32 {
    44100
}
fn default_buffer_size() -> usize {
    512
}

/// Master settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Master volume 0.0-1.0 (default: 0.7)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Sound mode at startup (default: creak)
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Velocity estimate smoothing time constant in ms (default: 40, 0 = raw)
    #[serde(default = "default_velocity_tau")]
    pub velocity_tau_ms: f64,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            mode: default_mode(),
            velocity_tau_ms: default_velocity_tau(),
        }
    }
}

fn default_volume() -> f32 {
    0.7
}
fn default_mode() -> String {
    "creak".to_string()
}
fn default_velocity_tau() -> f64 {
    40.0
}

/// Lid-angle sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Sensor type
    #[serde(default)]
    pub kind: SensorKind,

    /// Sensor-specific settings
    #[serde(default)]
    pub settings: HashMap<String, serde_yaml::Value>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::default(),
            settings: HashMap::new(),
        }
    }
}

/// Types of angle sensors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Simulated sinusoidal open/close motion (default)
    #[default]
    Sweep,
    /// Replay a recorded trace file
    Replay,
}

/// Settings for every sound mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModesConfig {
    #[serde(default)]
    pub creak: CreakConfig,
    #[serde(default)]
    pub theremin: ThereminConfig,
    #[serde(default)]
    pub gachi: TrackModeConfig,
    #[serde(default = "TrackModeConfig::anime_default")]
    pub anime: TrackModeConfig,
    #[serde(default = "TrackModeConfig::system_default")]
    pub system_sounds: TrackModeConfig,
}

// Must agree with the per-field serde defaults above, otherwise a config
// that omits the whole `modes` block gets different settings than one
// that omits only a sub-block.
impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            creak: CreakConfig::default(),
            theremin: ThereminConfig::default(),
            gachi: TrackModeConfig::default(),
            anime: TrackModeConfig::anime_default(),
            system_sounds: TrackModeConfig::system_default(),
        }
    }
}

/// Creak mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreakConfig {
    /// Looped creak sample; None synthesizes one
    #[serde(default)]
    pub sample: Option<PathBuf>,

    /// Gain ramp time constant in ms
    #[serde(default = "default_gain_tau")]
    pub gain_tau_ms: f64,

    /// Rate ramp time constant in ms
    #[serde(default = "default_rate_tau")]
    pub rate_tau_ms: f64,

    /// Speeds below this (deg/s) are silent
    #[serde(default = "default_deadzone")]
    pub deadzone: f64,

    /// Speed (deg/s) at which gain and rate max out
    #[serde(default = "default_saturation")]
    pub saturation: f64,

    /// Playback rate when still
    #[serde(default = "default_rate_min")]
    pub rate_min: f64,

    /// Playback rate at saturation speed
    #[serde(default = "default_rate_max")]
    pub rate_max: f64,
}

impl Default for CreakConfig {
    fn default() -> Self {
        Self {
            sample: None,
            gain_tau_ms: default_gain_tau(),
            rate_tau_ms: default_rate_tau(),
            deadzone: default_deadzone(),
            saturation: default_saturation(),
            rate_min: default_rate_min(),
            rate_max: default_rate_max(),
        }
    }
}

impl CreakConfig {
    fn validate(&self) -> Result<()> {
        if self.gain_tau_ms < 0.0 || self.rate_tau_ms < 0.0 {
            bail!("creak: ramp time constants must not be negative");
        }
        if self.deadzone < 0.0 {
            bail!("creak: deadzone must not be negative");
        }
        if self.saturation <= self.deadzone {
            bail!("creak: saturation must exceed the deadzone");
        }
        if self.rate_min <= 0.0 || self.rate_max < self.rate_min {
            bail!("creak: rate range must be positive and ordered");
        }
        Ok(())
    }
}

fn default_gain_tau() -> f64 {
    80.0
}
fn default_rate_tau() -> f64 {
    120.0
}
fn default_deadzone() -> f64 {
    2.0
}
fn default_saturation() -> f64 {
    180.0
}
fn default_rate_min() -> f64 {
    0.7
}
fn default_rate_max() -> f64 {
    1.5
}

/// Theremin mode settings (shared by both variants)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThereminConfig {
    /// Frequency at the closed end of the angle range
    #[serde(default = "default_freq_min")]
    pub freq_min: f64,

    /// Frequency at the open end of the angle range
    #[serde(default = "default_freq_max")]
    pub freq_max: f64,

    /// Angle mapped to freq_min
    #[serde(default = "default_angle_min")]
    pub angle_min: f64,

    /// Angle mapped to freq_max
    #[serde(default = "default_angle_max")]
    pub angle_max: f64,

    /// Pitch glide time constant in ms
    #[serde(default = "default_pitch_tau")]
    pub pitch_tau_ms: f64,

    /// Gain ramp time constant in ms
    #[serde(default = "default_theremin_gain_tau")]
    pub gain_tau_ms: f64,

    /// Tone level 0.0-1.0
    #[serde(default = "default_level")]
    pub level: f64,

    /// Motion variant: speeds below this are silent
    #[serde(default = "default_motion_deadzone")]
    pub motion_deadzone: f64,

    /// Motion variant: speed at which the tone reaches full level
    #[serde(default = "default_motion_saturation")]
    pub motion_saturation: f64,
}

impl Default for ThereminConfig {
    fn default() -> Self {
        Self {
            freq_min: default_freq_min(),
            freq_max: default_freq_max(),
            angle_min: default_angle_min(),
            angle_max: default_angle_max(),
            pitch_tau_ms: default_pitch_tau(),
            gain_tau_ms: default_theremin_gain_tau(),
            level: default_level(),
            motion_deadzone: default_motion_deadzone(),
            motion_saturation: default_motion_saturation(),
        }
    }
}

impl ThereminConfig {
    fn validate(&self) -> Result<()> {
        if self.freq_min <= 0.0 || self.freq_max <= self.freq_min {
            bail!("theremin: frequency range must be positive and ordered");
        }
        if self.angle_max <= self.angle_min {
            bail!("theremin: angle range must be ordered");
        }
        if self.pitch_tau_ms < 0.0 || self.gain_tau_ms < 0.0 {
            bail!("theremin: ramp time constants must not be negative");
        }
        if !(0.0..=1.0).contains(&self.level) {
            bail!("theremin: level must be between 0.0 and 1.0");
        }
        if self.motion_saturation <= self.motion_deadzone {
            bail!("theremin: motion saturation must exceed the deadzone");
        }
        Ok(())
    }
}

fn default_freq_min() -> f64 {
    220.0
}
fn default_freq_max() -> f64 {
    880.0
}
fn default_angle_min() -> f64 {
    10.0
}
fn default_angle_max() -> f64 {
    135.0
}
fn default_pitch_tau() -> f64 {
    60.0
}
fn default_theremin_gain_tau() -> f64 {
    100.0
}
fn default_level() -> f64 {
    0.4
}
fn default_motion_deadzone() -> f64 {
    3.0
}
fn default_motion_saturation() -> f64 {
    120.0
}

/// Settings for the triggered sample-bank modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackModeConfig {
    /// Directory of WAV tracks
    #[serde(default = "default_gachi_dir")]
    pub dir: PathBuf,

    /// Speed (deg/s) that fires a track
    #[serde(default = "default_trigger_velocity")]
    pub trigger_velocity: f64,

    /// Minimum time between triggers in ms
    #[serde(default = "default_retrigger_ms")]
    pub retrigger_ms: u64,

    /// Gain ramp time constant in ms
    #[serde(default = "default_track_gain_tau")]
    pub gain_tau_ms: f64,

    /// Rate ramp time constant in ms
    #[serde(default = "default_track_rate_tau")]
    pub rate_tau_ms: f64,

    /// Speeds below this (deg/s) contribute no gain
    #[serde(default = "default_deadzone")]
    pub deadzone: f64,

    /// Speed (deg/s) at which gain and stretch max out
    #[serde(default = "default_saturation")]
    pub saturation: f64,

    /// Minimum gain while a triggered track is sounding
    #[serde(default = "default_gain_floor")]
    pub gain_floor: f64,

    /// Playback rate when still (1.0 = no stretch)
    #[serde(default = "default_track_rate_min")]
    pub rate_min: f64,

    /// Playback rate at saturation speed
    #[serde(default = "default_track_rate_max")]
    pub rate_max: f64,
}

impl Default for TrackModeConfig {
    fn default() -> Self {
        Self {
            dir: default_gachi_dir(),
            trigger_velocity: default_trigger_velocity(),
            retrigger_ms: default_retrigger_ms(),
            gain_tau_ms: default_track_gain_tau(),
            rate_tau_ms: default_track_rate_tau(),
            deadzone: default_deadzone(),
            saturation: default_saturation(),
            gain_floor: default_gain_floor(),
            rate_min: default_track_rate_min(),
            rate_max: default_track_rate_max(),
        }
    }
}

impl TrackModeConfig {
    fn anime_default() -> Self {
        Self {
            dir: PathBuf::from("sounds/anime"),
            rate_max: 1.0, // no stretch
            ..Self::default()
        }
    }

    fn system_default() -> Self {
        Self {
            dir: default_system_dir(),
            rate_max: 1.0,
            ..Self::default()
        }
    }

    fn validate(&self, mode: &str) -> Result<()> {
        if self.trigger_velocity <= 0.0 {
            bail!("{}: trigger velocity must be positive", mode);
        }
        if self.gain_tau_ms < 0.0 || self.rate_tau_ms < 0.0 {
            bail!("{}: ramp time constants must not be negative", mode);
        }
        if self.saturation <= self.deadzone {
            bail!("{}: saturation must exceed the deadzone", mode);
        }
        if !(0.0..=1.0).contains(&self.gain_floor) {
            bail!("{}: gain floor must be between 0.0 and 1.0", mode);
        }
        if self.rate_min <= 0.0 || self.rate_max < self.rate_min {
            bail!("{}: rate range must be positive and ordered", mode);
        }
        Ok(())
    }
}

fn default_gachi_dir() -> PathBuf {
    PathBuf::from("sounds/gachi")
}

#[cfg(target_os = "macos")]
fn default_system_dir() -> PathBuf {
    PathBuf::from("/System/Library/Sounds")
}

#[cfg(not(target_os = "macos"))]
fn default_system_dir() -> PathBuf {
    PathBuf::from("sounds/system")
}

fn default_trigger_velocity() -> f64 {
    25.0
}
fn default_retrigger_ms() -> u64 {
    250
}
fn default_track_gain_tau() -> f64 {
    60.0
}
fn default_track_rate_tau() -> f64 {
    150.0
}
fn default_gain_floor() -> f64 {
    0.5
}
fn default_track_rate_min() -> f64 {
    1.0
}
fn default_track_rate_max() -> f64 {
    1.4
}
