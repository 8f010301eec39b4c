//! Triggered sample-bank engine
//!
//! Backs the Gachi, Anime, and SystemSounds modes. A fast hinge motion
//! (rising edge over the trigger velocity, with a retrigger cooldown)
//! fires one track from the bank - random by default, or the pinned
//! track if the user selected one. Gain follows hinge speed with a
//! floor while a track is sounding; Gachi stretches playback rate with
//! speed as well.

use super::{EngineParams, SoundEngine, SoundMode};
use crate::config::TrackModeConfig;
use crate::mapping::VelocityCurve;
use crate::synth::{SampleBank, SamplePlayer, TrackSelector};
use anyhow::Result;

pub struct TriggeredEngine {
    mode: SoundMode,
    params: EngineParams,
    bank: SampleBank,
    selector: TrackSelector,
    player: SamplePlayer,
    gain_curve: VelocityCurve,
    rate_curve: VelocityCurve,
    trigger_velocity: f64,
    /// Keeps a sounding track audible as the motion that fired it decays
    gain_floor: f64,
    retrigger: f64,
    /// Seconds since the last trigger
    since_trigger: f64,
    /// Re-arms once speed falls below half the trigger threshold
    armed: bool,
    last_track: Option<usize>,
}

impl TriggeredEngine {
    pub fn new(
        mode: SoundMode,
        bank: SampleBank,
        config: &TrackModeConfig,
        sample_rate: f64,
    ) -> Self {
        Self {
            mode,
            params: EngineParams::new(config.gain_tau_ms, config.rate_tau_ms),
            bank,
            selector: TrackSelector::new(),
            player: SamplePlayer::new(sample_rate),
            gain_curve: VelocityCurve::new(config.deadzone, config.saturation, 0.0, 1.0),
            rate_curve: VelocityCurve::new(0.0, config.saturation, config.rate_min, config.rate_max),
            trigger_velocity: config.trigger_velocity,
            gain_floor: config.gain_floor,
            retrigger: config.retrigger_ms as f64 / 1000.0,
            since_trigger: f64::MAX,
            armed: true,
            last_track: None,
        }
    }

    /// Deterministic selector seed for tests
    #[cfg(test)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.selector = TrackSelector::with_seed(seed);
        self
    }

    /// Index of the most recently fired track
    pub fn last_track(&self) -> Option<usize> {
        self.last_track
    }

    fn fire(&mut self) {
        let Some(index) = self.selector.pick(self.bank.len()) else {
            return;
        };
        if let Some(sample) = self.bank.get(index) {
            self.player.set_sample(sample.clone());
            self.player.set_rate(self.params.rate());
            self.player.trigger();
            self.last_track = Some(index);
        }
    }
}

impl SoundEngine for TriggeredEngine {
    fn mode(&self) -> SoundMode {
        self.mode
    }

    fn start(&mut self) -> Result<()> {
        if self.bank.is_empty() {
            eprintln!(
                "Warning: no tracks loaded for {} mode, playing silence",
                self.mode.name()
            );
        }
        self.params.start();
        self.armed = true;
        self.since_trigger = f64::MAX;
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

        let speed = velocity.abs();
        if self.since_trigger < f64::MAX {
            self.since_trigger += dt;
        }

        // Rising-edge trigger with hysteresis and cooldown
        if speed >= self.trigger_velocity {
            if self.armed && self.since_trigger >= self.retrigger {
                self.fire();
                self.since_trigger = 0.0;
                self.armed = false;
            }
        } else if speed < self.trigger_velocity * 0.5 {
            self.armed = true;
        }

        let mut gain_target = self.gain_curve.map(velocity);
        if self.player.is_playing() {
            gain_target = gain_target.max(self.gain_floor);
        }
        self.params.set_targets(gain_target, self.rate_curve.map(velocity));
        self.params.tick(dt);
        self.player.set_rate(self.params.rate());
    }

    fn process(&mut self) -> f64 {
        if !self.params.is_running() {
            return 0.0;
        }
        self.player.process() * self.params.gain()
    }

    fn current_gain(&self) -> f64 {
        self.params.gain()
    }

    fn current_rate(&self) -> f64 {
        self.params.rate()
    }

    fn select_track(&mut self, index: usize) -> bool {
        self.selector.pin(index, self.bank.len())
    }

    fn reset_track(&mut self) {
        self.selector.reset();
    }

    fn track_names(&self) -> Vec<String> {
        self.bank.names()
    }

    fn last_triggered_track(&self) -> Option<usize> {
        self.last_track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Sample;

    fn test_bank(tracks: usize) -> SampleBank {
        let mut bank = SampleBank::new();
        for i in 0..tracks {
            bank.push(Sample::from_frames(
                format!("track_{}", i),
                vec![0.5; 4410],
                44100,
            ));
        }
        bank
    }

    fn engine(tracks: usize) -> TriggeredEngine {
        let mut e = TriggeredEngine::new(
            SoundMode::Gachi,
            test_bank(tracks),
            &TrackModeConfig::default(),
            44100.0,
        )
        .with_seed(42);
        e.start().unwrap();
        e
    }

    /// Drive one fast flick of the lid, then let it settle
    fn flick(e: &mut TriggeredEngine) {
        for _ in 0..20 {
            e.update(90.0, 200.0, 0.01);
        }
        for _ in 0..100 {
            e.update(90.0, 0.0, 0.01);
        }
    }

    #[test]
    fn test_fast_motion_fires_a_track() {
        let mut e = engine(3);
        assert_eq!(e.last_track(), None);
        flick(&mut e);
        assert!(e.last_track().is_some());
    }

    #[test]
    fn test_slow_motion_fires_nothing() {
        let mut e = engine(3);
        for _ in 0..500 {
            e.update(90.0, 5.0, 0.01);
        }
        assert_eq!(e.last_track(), None);
    }

    #[test]
    fn test_sustained_motion_does_not_retrigger() {
        let mut e = engine(3);
        // Hold fast motion for 2 seconds; only the initial edge fires
        for _ in 0..200 {
            e.update(90.0, 300.0, 0.01);
        }
        let first = e.last_track();
        assert!(first.is_some());

        // Still moving fast - not re-armed, no second trigger recorded
        // (last_track may repeat, so verify via armed state by settling
        // and flicking again, which must fire)
        for _ in 0..100 {
            e.update(90.0, 0.0, 0.01);
        }
        flick(&mut e);
        assert!(e.last_track().is_some());
    }

    #[test]
    fn test_rearmed_spike_within_cooldown_does_not_fire() {
        let mut e = engine(3);
        e.select_track(0);

        // First spike fires the pinned track
        for _ in 0..5 {
            e.update(90.0, 200.0, 0.01);
        }
        assert_eq!(e.last_track(), Some(0));

        // Re-arm by settling below half the threshold, but spike again
        // inside the 250ms cooldown; pin a different track so a second
        // fire would be visible
        e.select_track(1);
        for _ in 0..5 {
            e.update(90.0, 0.0, 0.01);
        }
        for _ in 0..5 {
            e.update(90.0, 200.0, 0.01);
        }
        assert_eq!(e.last_track(), Some(0), "fired inside the cooldown");

        // Once the cooldown has elapsed the same pattern fires
        for _ in 0..30 {
            e.update(90.0, 0.0, 0.01);
        }
        for _ in 0..5 {
            e.update(90.0, 200.0, 0.01);
        }
        assert_eq!(e.last_track(), Some(1));
    }

    #[test]
    fn test_pinned_track_is_deterministic() {
        let mut e = engine(5);
        assert!(e.select_track(2));

        for _ in 0..5 {
            flick(&mut e);
            assert_eq!(e.last_track(), Some(2));
        }
    }

    #[test]
    fn test_reset_restores_random_selection() {
        let mut e = engine(5);
        e.select_track(4);
        flick(&mut e);
        assert_eq!(e.last_track(), Some(4));

        e.reset_track();
        let mut saw_other = false;
        for _ in 0..30 {
            flick(&mut e);
            if e.last_track() != Some(4) {
                saw_other = true;
                break;
            }
        }
        assert!(saw_other);
    }

    #[test]
    fn test_pin_out_of_range_rejected() {
        let mut e = engine(3);
        assert!(!e.select_track(3));
        assert!(!e.select_track(99));
    }

    #[test]
    fn test_empty_bank_plays_silence() {
        let mut e = TriggeredEngine::new(
            SoundMode::Anime,
            SampleBank::new(),
            &TrackModeConfig::default(),
            44100.0,
        );
        e.start().unwrap();

        for _ in 0..100 {
            e.update(90.0, 300.0, 0.01);
        }
        assert_eq!(e.last_track(), None);
        assert_eq!(e.process(), 0.0);
    }

    #[test]
    fn test_track_names_come_from_bank() {
        let e = engine(2);
        assert_eq!(e.track_names(), vec!["track_0", "track_1"]);
    }

    #[test]
    fn test_triggered_track_is_audible() {
        let mut e = engine(1);
        for _ in 0..30 {
            e.update(90.0, 200.0, 0.01);
        }
        let mut max = 0.0f64;
        for _ in 0..1000 {
            max = max.max(e.process().abs());
        }
        assert!(max > 0.0, "triggered track produced no audio");
    }
}
