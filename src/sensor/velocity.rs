//! Angular velocity estimation
//!
//! Derives degrees/second from consecutive angle samples. The raw
//! derivative is jumpy at typical sensor poll rates, so the estimate
//! can be smoothed with the same exponential ramp the engines use.

use crate::mapping::ramp;
use crate::sensor::AngleSample;

/// Estimates angular velocity from an angle sample stream
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    previous: Option<AngleSample>,
    velocity: f64,
    /// Smoothing time constant in ms; 0 = raw derivative
    tau_ms: f64,
}

impl VelocityEstimator {
    /// Create an estimator with the given smoothing time constant
    pub fn new(tau_ms: f64) -> Self {
        Self {
            previous: None,
            velocity: 0.0,
            tau_ms: tau_ms.max(0.0),
        }
    }

    /// Feed the next sample and return the updated velocity estimate.
    ///
    /// The first sample only establishes history. Samples with a
    /// non-positive time delta retain the previous estimate rather
    /// than dividing by zero.
    pub fn update(&mut self, sample: AngleSample) -> f64 {
        if let Some(prev) = self.previous {
            let dt = sample
                .timestamp
                .saturating_duration_since(prev.timestamp)
                .as_secs_f64();
            if dt > 0.0 {
                let raw = (sample.degrees - prev.degrees) / dt;
                self.velocity = ramp(self.velocity, raw, dt, self.tau_ms);
                self.previous = Some(sample);
            }
            // dt <= 0: keep the old estimate and the old reference point
        } else {
            self.previous = Some(sample);
        }
        self.velocity
    }

    /// Current velocity estimate in degrees/second
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Forget history, e.g. when the sensor stream restarts.
    ///
    /// Without this, the first sample after a long gap would read as a
    /// slow sweep across the whole gap.
    pub fn reset(&mut self) {
        self.previous = None;
        self.velocity = 0.0;
    }
}
