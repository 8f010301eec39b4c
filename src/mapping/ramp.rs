//! Exponential parameter ramping
//!
//! Every engine moves its gain and rate toward target values with a
//! first-order exponential filter so parameter changes never click.
//! The filter is tick-rate independent: the time constant, not the
//! update interval, decides how fast a value settles.

/// Ramp a value toward a target with exponential decay.
///
/// `dt` is the elapsed time in seconds, `tau_ms` the time constant in
/// milliseconds. A non-positive `dt` leaves the value unchanged; a
/// non-positive `tau_ms` snaps directly to the target.
pub fn ramp(current: f64, target: f64, dt: f64, tau_ms: f64) -> f64 {
    if dt <= 0.0 {
        return current;
    }
    if tau_ms <= 0.0 {
        return target;
    }
    target + (current - target) * (-dt / (tau_ms / 1000.0)).exp()
}

/// A smoothed parameter: current value chasing a target.
///
/// The target is set by mode logic from the sensor signal; the current
/// value is advanced once per update tick and is what actually drives
/// playback.
#[derive(Debug, Clone)]
pub struct Smoother {
    value: f64,
    target: f64,
    tau_ms: f64,
}

impl Smoother {
    /// Create a smoother starting at `initial` with the given time constant.
    pub fn new(initial: f64, tau_ms: f64) -> Self {
        Self {
            value: initial,
            target: initial,
            tau_ms,
        }
    }

    /// Set the value the smoother ramps toward.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump immediately to a value, clearing any in-flight ramp.
    pub fn snap(&mut self, value: f64) {
        self.value = value;
        self.target = value;
    }

    /// Advance the ramp by `dt` seconds and return the new value.
    pub fn tick(&mut self, dt: f64) -> f64 {
        self.value = ramp(self.value, self.target, dt, self.tau_ms);
        self.value
    }

    /// Current (smoothed) value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Target the value is converging toward.
    pub fn target(&self) -> f64 {
        self.target
    }
}
