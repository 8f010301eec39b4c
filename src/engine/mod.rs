//! Sound management for Hinge
//!
//! The `SoundManager` owns the active sound engine, derives velocity
//! from incoming angle samples, and mixes the engine's output through
//! the master volume. One timer-driven caller updates it; the audio
//! callback only pulls samples.

mod midi;
mod player;
mod recorder;

pub use midi::{list_midi_ports, MidiFeedback, MidiFeedbackConfig, MidiMessage};
pub use player::{list_output_devices, Player};
pub use recorder::Recorder;

use crate::config::HingeConfig;
use crate::modes::{build_engine, SoundEngine, SoundMode};
use crate::sensor::{AngleSample, VelocityEstimator};
use anyhow::Result;
use std::time::Instant;

/// Owns the active engine and the angle-to-sound signal path
pub struct SoundManager {
    config: HingeConfig,
    mode: SoundMode,
    engine: Option<Box<dyn SoundEngine>>,
    estimator: VelocityEstimator,
    last_update: Option<Instant>,
    current_angle: f64,
    master_volume: f32,
    enabled: bool,
    sample_rate: f64,
}

impl SoundManager {
    /// Create a manager with no engine active
    pub fn new(config: HingeConfig) -> Self {
        let sample_rate = config.audio.sample_rate as f64;
        let estimator = VelocityEstimator::new(config.master.velocity_tau_ms);
        let master_volume = config.master.volume;

        Self {
            config,
            mode: SoundMode::Off,
            engine: None,
            estimator,
            last_update: None,
            current_angle: 0.0,
            master_volume,
            enabled: true,
            sample_rate,
        }
    }

    /// Create a manager already switched to the config's startup mode
    pub fn with_startup_mode(config: HingeConfig) -> Result<Self> {
        let mode = config.startup_mode();
        let mut manager = Self::new(config);
        manager.set_mode(mode)?;
        Ok(manager)
    }

    /// Sample rate the engines run at
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The active sound mode
    pub fn mode(&self) -> SoundMode {
        self.mode
    }

    /// Switch sound mode, stopping the old engine and starting the new one
    pub fn set_mode(&mut self, mode: SoundMode) -> Result<()> {
        if let Some(engine) = &mut self.engine {
            engine.stop();
        }

        self.engine = build_engine(mode, &self.config.modes, self.sample_rate);
        self.mode = mode;

        if let Some(engine) = &mut self.engine {
            engine.start()?;
        }
        Ok(())
    }

    /// Cycle to the next mode (TUI keybinding)
    pub fn cycle_mode(&mut self) -> Result<()> {
        self.set_mode(self.mode.next())
    }

    /// Feed the next angle sample through the signal path
    pub fn update(&mut self, sample: AngleSample) {
        let velocity = self.estimator.update(sample);
        self.current_angle = sample.degrees;

        let dt = self
            .last_update
            .map(|prev| sample.timestamp.saturating_duration_since(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_update = Some(sample.timestamp);

        if !self.enabled {
            return;
        }
        if let Some(engine) = &mut self.engine {
            engine.update(sample.degrees, velocity, dt);
        }
    }

    /// Generate the next output sample (engine output x master volume)
    pub fn process(&mut self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let source = match &mut self.engine {
            Some(engine) => engine.process(),
            None => 0.0,
        };
        source * self.master_volume as f64
    }

    /// Fill a buffer with output samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process() as f32;
        }
    }

    /// Latest lid angle in degrees
    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// Latest velocity estimate in degrees/second
    pub fn current_velocity(&self) -> f64 {
        self.estimator.velocity()
    }

    /// Smoothed gain of the active engine
    pub fn current_gain(&self) -> f64 {
        self.engine.as_ref().map(|e| e.current_gain()).unwrap_or(0.0)
    }

    /// Smoothed rate of the active engine
    pub fn current_rate(&self) -> f64 {
        self.engine.as_ref().map(|e| e.current_rate()).unwrap_or(1.0)
    }

    /// Master volume 0.0-1.0
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Set master volume, clamped to 0.0-1.0
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Whether audio output is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or mute audio without tearing down the engine
    pub fn enable_audio(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Pin a track on the active engine
    pub fn select_track(&mut self, index: usize) -> bool {
        self.engine
            .as_mut()
            .map(|e| e.select_track(index))
            .unwrap_or(false)
    }

    /// Clear any pinned track on the active engine
    pub fn reset_track(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.reset_track();
        }
    }

    /// Track names of the active engine (empty for non-track modes)
    pub fn track_names(&self) -> Vec<String> {
        self.engine
            .as_ref()
            .map(|e| e.track_names())
            .unwrap_or_default()
    }

    /// Index of the most recently fired track (track modes only)
    pub fn last_triggered_track(&self) -> Option<usize> {
        self.engine.as_ref().and_then(|e| e.last_triggered_track())
    }

    /// Stop the engine and clear sensor history
    pub fn stop_all(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.stop();
        }
        self.engine = None;
        self.mode = SoundMode::Off;
        self.estimator.reset();
        self.last_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn manager() -> SoundManager {
        SoundManager::new(HingeConfig::default())
    }

    /// Feed a constant-velocity sweep, `deg_per_sec` for `ticks` x 10ms
    fn sweep(m: &mut SoundManager, start_deg: f64, deg_per_sec: f64, ticks: usize) {
        let t0 = Instant::now();
        for i in 0..ticks {
            let t = i as f64 * 0.01;
            m.update(AngleSample::at(
                start_deg + deg_per_sec * t,
                t0 + Duration::from_millis((i * 10) as u64),
            ));
        }
    }

    #[test]
    fn test_manager_starts_off_and_silent() {
        let mut m = manager();
        assert_eq!(m.mode(), SoundMode::Off);
        assert_eq!(m.process(), 0.0);
        assert_eq!(m.current_gain(), 0.0);
        assert_eq!(m.current_rate(), 1.0);
    }

    #[test]
    fn test_startup_mode_from_config() {
        let m = SoundManager::with_startup_mode(HingeConfig::default()).unwrap();
        assert_eq!(m.mode(), SoundMode::Creak);
    }

    #[test]
    fn test_update_tracks_angle_and_velocity() {
        let mut m = manager();
        sweep(&mut m, 30.0, 100.0, 200);

        assert!((m.current_angle() - (30.0 + 100.0 * 1.99)).abs() < 1e-6);
        assert!((m.current_velocity() - 100.0).abs() < 2.0, "velocity {}", m.current_velocity());
    }

    #[test]
    fn test_creak_mode_produces_audio_when_moving() {
        let mut m = manager();
        m.set_mode(SoundMode::Creak).unwrap();
        sweep(&mut m, 30.0, 120.0, 200);

        let mut max = 0.0f64;
        for _ in 0..1000 {
            max = max.max(m.process().abs());
        }
        assert!(max > 0.0, "expected audio while moving");
        assert!(m.current_gain() > 0.1);
    }

    #[test]
    fn test_master_volume_scales_output() {
        let mut m = manager();
        m.set_mode(SoundMode::Theremin).unwrap();
        sweep(&mut m, 90.0, 0.0, 500);

        m.set_master_volume(0.0);
        for _ in 0..100 {
            assert_eq!(m.process(), 0.0);
        }
    }

    #[test]
    fn test_volume_clamped() {
        let mut m = manager();
        m.set_master_volume(3.0);
        assert_eq!(m.master_volume(), 1.0);
        m.set_master_volume(-1.0);
        assert_eq!(m.master_volume(), 0.0);
    }

    #[test]
    fn test_disable_audio_mutes_and_freezes() {
        let mut m = manager();
        m.set_mode(SoundMode::Theremin).unwrap();
        sweep(&mut m, 90.0, 0.0, 100);

        m.enable_audio(false);
        assert!(!m.is_enabled());
        assert_eq!(m.process(), 0.0);

        m.enable_audio(true);
        let mut max = 0.0f64;
        for _ in 0..500 {
            max = max.max(m.process().abs());
        }
        assert!(max > 0.0);
    }

    #[test]
    fn test_mode_switch_replaces_engine() {
        let mut m = manager();
        m.set_mode(SoundMode::Creak).unwrap();
        assert_eq!(m.mode(), SoundMode::Creak);

        m.set_mode(SoundMode::Theremin).unwrap();
        assert_eq!(m.mode(), SoundMode::Theremin);

        m.set_mode(SoundMode::Off).unwrap();
        assert_eq!(m.mode(), SoundMode::Off);
        assert_eq!(m.process(), 0.0);
    }

    #[test]
    fn test_track_operations_on_non_track_mode() {
        let mut m = manager();
        m.set_mode(SoundMode::Creak).unwrap();
        assert!(!m.select_track(0));
        assert!(m.track_names().is_empty());
        m.reset_track(); // no-op, must not panic
    }

    #[test]
    fn test_stop_all_clears_engine() {
        let mut m = manager();
        m.set_mode(SoundMode::Creak).unwrap();
        sweep(&mut m, 30.0, 100.0, 50);

        m.stop_all();
        assert_eq!(m.mode(), SoundMode::Off);
        assert_eq!(m.process(), 0.0);
        assert_eq!(m.current_velocity(), 0.0);
    }
}
