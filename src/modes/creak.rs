//! Creak sound engine
//!
//! Loops a door-creak sample whose loudness and playback rate follow
//! hinge speed: a still lid is silent, slow motion groans low, fast
//! motion creaks loud and high. When no sample file is available the
//! engine synthesizes a filtered-noise creak instead of going silent
//! on the wrong path.

use super::{EngineParams, SoundEngine, SoundMode};
use crate::config::CreakConfig;
use crate::mapping::VelocityCurve;
use crate::synth::{Oscillator, Sample, SamplePlayer, Waveform};
use anyhow::Result;

pub struct CreakEngine {
    params: EngineParams,
    gain_curve: VelocityCurve,
    rate_curve: VelocityCurve,
    player: SamplePlayer,
    /// Fallback voice when no sample is loaded
    noise: Oscillator,
    filter_state: f64,
    sample_rate: f64,
}

impl CreakEngine {
    pub fn new(config: &CreakConfig, sample_rate: f64) -> Self {
        let mut player = SamplePlayer::new(sample_rate);
        player.set_looping(true);

        if let Some(path) = &config.sample {
            match Sample::load(path) {
                Ok(sample) => player.set_sample(sample),
                Err(e) => eprintln!("Warning: creak sample unavailable ({}), synthesizing", e),
            }
        }

        Self {
            params: EngineParams::new(config.gain_tau_ms, config.rate_tau_ms),
            gain_curve: VelocityCurve::new(config.deadzone, config.saturation, 0.0, 1.0),
            rate_curve: VelocityCurve::new(0.0, config.saturation, config.rate_min, config.rate_max),
            player,
            noise: Oscillator::new(Waveform::WhiteNoise, 440.0, sample_rate),
            filter_state: 0.0,
            sample_rate,
        }
    }

    /// One-pole low-pass; cutoff rides the playback rate so the
    /// synthesized creak darkens and brightens with motion
    fn filtered_noise(&mut self) -> f64 {
        let cutoff = 250.0 * self.params.rate();
        let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff);
        let dt = 1.0 / self.sample_rate;
        let alpha = dt / (rc + dt);

        let input = self.noise.generate();
        self.filter_state += alpha * (input - self.filter_state);
        self.filter_state
    }
}

impl SoundEngine for CreakEngine {
    fn mode(&self) -> SoundMode {
        SoundMode::Creak
    }

    fn start(&mut self) -> Result<()> {
        self.params.start();
        if self.player.has_sample() {
            self.player.trigger();
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.params.stop();
        self.player.stop();
    }

    fn is_running(&self) -> bool {
        self.params.is_running()
    }

    fn update(&mut self, _angle: f64, velocity: f64, dt: f64) {
        if !self.params.is_running() {
            return;
        }
        self.params
            .set_targets(self.gain_curve.map(velocity), self.rate_curve.map(velocity));
        self.params.tick(dt);
        self.player.set_rate(self.params.rate());
    }

    fn process(&mut self) -> f64 {
        if !self.params.is_running() {
            return 0.0;
        }
        let source = if self.player.is_playing() {
            self.player.process()
        } else {
            self.filtered_noise()
        };
        source * self.params.gain()
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

    fn engine() -> CreakEngine {
        let mut e = CreakEngine::new(&CreakConfig::default(), 44100.0);
        e.start().unwrap();
        e
    }

    #[test]
    fn test_still_lid_is_silent() {
        let mut e = engine();
        // Settle with zero velocity
        for _ in 0..200 {
            e.update(90.0, 0.0, 0.01);
        }
        assert!(e.current_gain() < 1e-6);
        assert!(e.process().abs() < 1e-6);
    }

    #[test]
    fn test_motion_raises_gain() {
        let mut e = engine();
        for _ in 0..200 {
            e.update(90.0, 120.0, 0.01);
        }
        assert!(e.current_gain() > 0.3, "gain {}", e.current_gain());

        // Output is nonzero while moving
        let mut max = 0.0f64;
        for _ in 0..500 {
            max = max.max(e.process().abs());
        }
        assert!(max > 0.0);
    }

    #[test]
    fn test_faster_motion_raises_rate() {
        let mut slow = engine();
        let mut fast = engine();
        for _ in 0..500 {
            slow.update(90.0, 20.0, 0.01);
            fast.update(90.0, 160.0, 0.01);
        }
        assert!(fast.current_rate() > slow.current_rate());
    }

    #[test]
    fn test_gain_ramps_instead_of_jumping() {
        let mut e = engine();
        e.update(90.0, 150.0, 0.005);
        let after_one_tick = e.current_gain();
        // One 5ms tick with an 80ms tau cannot reach the target
        assert!(after_one_tick > 0.0 && after_one_tick < 0.5);
    }

    #[test]
    fn test_stopped_engine_ignores_updates() {
        let mut e = engine();
        e.stop();
        e.update(90.0, 150.0, 0.01);
        assert_eq!(e.current_gain(), 0.0);
        assert_eq!(e.process(), 0.0);
    }

    #[test]
    fn test_direction_does_not_matter() {
        let mut opening = engine();
        let mut closing = engine();
        for _ in 0..100 {
            opening.update(90.0, 80.0, 0.01);
            closing.update(90.0, -80.0, 0.01);
        }
        assert!((opening.current_gain() - closing.current_gain()).abs() < 1e-9);
    }
}
