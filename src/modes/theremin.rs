//! Theremin sound engine
//!
//! A continuously parameterized sine tone: lid angle maps to pitch over
//! a configurable range. The plain variant sustains while the engine
//! runs; the motion variant gates its gain on hinge speed so the tone
//! only swells while the lid moves.

use super::{EngineParams, SoundEngine, SoundMode};
use crate::config::ThereminConfig;
use crate::mapping::{AngleCurve, Smoother, VelocityCurve};
use crate::synth::{Oscillator, Waveform};
use anyhow::Result;

pub struct ThereminEngine {
    params: EngineParams,
    /// Smoothed oscillator frequency in Hz
    pitch: Smoother,
    pitch_curve: AngleCurve,
    motion_curve: VelocityCurve,
    osc: Oscillator,
    level: f64,
    freq_min: f64,
    motion_gated: bool,
}

impl ThereminEngine {
    /// `motion_gated` selects the ThereminMotion variant
    pub fn new(config: &ThereminConfig, sample_rate: f64, motion_gated: bool) -> Self {
        let start_freq = config.freq_min;
        Self {
            params: EngineParams::new(config.gain_tau_ms, config.pitch_tau_ms),
            pitch: Smoother::new(start_freq, config.pitch_tau_ms),
            pitch_curve: AngleCurve::new(
                config.angle_min,
                config.angle_max,
                config.freq_min,
                config.freq_max,
            ),
            motion_curve: VelocityCurve::new(
                config.motion_deadzone,
                config.motion_saturation,
                0.0,
                1.0,
            ),
            osc: Oscillator::new(Waveform::Sine, start_freq, sample_rate),
            level: config.level,
            freq_min: config.freq_min.max(1.0),
            motion_gated,
        }
    }

    /// Smoothed frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.pitch.value()
    }
}

impl SoundEngine for ThereminEngine {
    fn mode(&self) -> SoundMode {
        if self.motion_gated {
            SoundMode::ThereminMotion
        } else {
            SoundMode::Theremin
        }
    }

    fn start(&mut self) -> Result<()> {
        self.params.start();
        self.osc.reset();
        Ok(())
    }

    fn stop(&mut self) {
        self.params.stop();
    }

    fn is_running(&self) -> bool {
        self.params.is_running()
    }

    fn update(&mut self, angle: f64, velocity: f64, dt: f64) {
        if !self.params.is_running() {
            return;
        }

        let gain_target = if self.motion_gated {
            self.motion_curve.map(velocity) * self.level
        } else {
            self.level
        };
        self.pitch.set_target(self.pitch_curve.map(angle));
        let freq = self.pitch.tick(dt);
        // Rate for a tone is its frequency relative to the range floor
        self.params.set_targets(gain_target, freq / self.freq_min);
        self.params.tick(dt);

        self.osc.set_frequency(freq);
    }

    fn process(&mut self) -> f64 {
        if !self.params.is_running() {
            return 0.0;
        }
        self.osc.generate() * self.params.gain()
    }

    fn current_gain(&self) -> f64 {
        self.params.gain()
    }

    fn current_rate(&self) -> f64 {
        self.params.rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(motion: bool) -> ThereminEngine {
        let mut e = ThereminEngine::new(&ThereminConfig::default(), 44100.0, motion);
        e.start().unwrap();
        e
    }

    #[test]
    fn test_angle_controls_pitch() {
        let config = ThereminConfig::default();
        let mut low = engine(false);
        let mut high = engine(false);

        for _ in 0..2000 {
            low.update(config.angle_min, 0.0, 0.01);
            high.update(config.angle_max, 0.0, 0.01);
        }
        assert!((low.frequency() - config.freq_min).abs() < 1.0);
        assert!((high.frequency() - config.freq_max).abs() < 1.0);
        assert!(high.frequency() > low.frequency());
    }

    #[test]
    fn test_pitch_glides_between_angles() {
        let mut e = engine(false);
        for _ in 0..2000 {
            e.update(20.0, 0.0, 0.01);
        }
        let before = e.frequency();

        // Jump the lid angle; the tone must glide, not step
        e.update(120.0, 0.0, 0.01);
        let after_one_tick = e.frequency();
        assert!(after_one_tick > before);

        let target = ThereminConfig::default();
        let full = AngleCurve::new(
            target.angle_min,
            target.angle_max,
            target.freq_min,
            target.freq_max,
        )
        .map(120.0);
        assert!(after_one_tick < full, "jumped straight to target");
    }

    #[test]
    fn test_plain_variant_sustains_when_still() {
        let mut e = engine(false);
        for _ in 0..1000 {
            e.update(90.0, 0.0, 0.01);
        }
        assert!(e.current_gain() > 0.1);

        let mut max = 0.0f64;
        for _ in 0..1000 {
            max = max.max(e.process().abs());
        }
        assert!(max > 0.0);
    }

    #[test]
    fn test_motion_variant_silent_when_still() {
        let mut e = engine(true);
        for _ in 0..1000 {
            e.update(90.0, 0.0, 0.01);
        }
        assert!(e.current_gain() < 1e-6);
    }

    #[test]
    fn test_motion_variant_swells_with_movement() {
        let mut e = engine(true);
        for _ in 0..1000 {
            e.update(90.0, 100.0, 0.01);
        }
        assert!(e.current_gain() > 0.05, "gain {}", e.current_gain());
    }

    #[test]
    fn test_stop_silences_output() {
        let mut e = engine(false);
        for _ in 0..100 {
            e.update(90.0, 0.0, 0.01);
        }
        e.stop();
        assert_eq!(e.process(), 0.0);
        assert_eq!(e.current_gain(), 0.0);
    }
}
