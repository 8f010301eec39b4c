//! Velocity and angle response curves
//!
//! Translate the raw sensor signal into parameter targets: hinge speed
//! becomes gain, lid angle becomes pitch. These produce the *targets*
//! the ramp filter then chases.

/// Maps |velocity| (degrees/second) to a normalized output range.
///
/// Motion slower than the deadzone produces the minimum output (a still
/// lid is silent); motion at or beyond saturation pins the maximum.
/// In between the response is linear.
#[derive(Debug, Clone)]
pub struct VelocityCurve {
    deadzone: f64,
    saturation: f64,
    out_min: f64,
    out_max: f64,
}

impl VelocityCurve {
    /// Create a curve mapping `deadzone..saturation` deg/s to `out_min..out_max`.
    pub fn new(deadzone: f64, saturation: f64, out_min: f64, out_max: f64) -> Self {
        Self {
            deadzone: deadzone.max(0.0),
            saturation,
            out_min,
            out_max,
        }
    }

    /// Map a signed velocity; only the magnitude matters.
    ///
    /// A degenerate span (saturation <= deadzone) saturates immediately
    /// above the deadzone instead of dividing by zero.
    pub fn map(&self, velocity: f64) -> f64 {
        let speed = velocity.abs();
        if speed <= self.deadzone {
            return self.out_min;
        }
        let span = self.saturation - self.deadzone;
        if span <= 0.0 {
            return self.out_max;
        }
        let normalized = ((speed - self.deadzone) / span).clamp(0.0, 1.0);
        self.out_min + normalized * (self.out_max - self.out_min)
    }
}

/// Maps a lid angle to a frequency range (theremin pitch).
///
/// Angles outside the configured span clamp to the range endpoints.
#[derive(Debug, Clone)]
pub struct AngleCurve {
    angle_min: f64,
    angle_max: f64,
    freq_min: f64,
    freq_max: f64,
}

impl AngleCurve {
    pub fn new(angle_min: f64, angle_max: f64, freq_min: f64, freq_max: f64) -> Self {
        Self {
            angle_min,
            angle_max,
            freq_min,
            freq_max,
        }
    }

    /// Map an angle in degrees to a frequency in Hz.
    pub fn map(&self, angle: f64) -> f64 {
        let span = self.angle_max - self.angle_min;
        let normalized = if span.abs() < f64::EPSILON {
            0.5
        } else {
            ((angle - self.angle_min) / span).clamp(0.0, 1.0)
        };
        self.freq_min + normalized * (self.freq_max - self.freq_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_curve_deadzone_is_silent() {
        let curve = VelocityCurve::new(2.0, 100.0, 0.0, 1.0);
        assert_eq!(curve.map(0.0), 0.0);
        assert_eq!(curve.map(1.5), 0.0);
        assert_eq!(curve.map(-1.5), 0.0);
    }

    #[test]
    fn test_velocity_curve_saturates() {
        let curve = VelocityCurve::new(2.0, 100.0, 0.0, 1.0);
        assert_eq!(curve.map(100.0), 1.0);
        assert_eq!(curve.map(500.0), 1.0);
        assert_eq!(curve.map(-500.0), 1.0);
    }

    #[test]
    fn test_velocity_curve_direction_agnostic() {
        let curve = VelocityCurve::new(0.0, 100.0, 0.0, 1.0);
        assert_eq!(curve.map(50.0), curve.map(-50.0));
    }

    #[test]
    fn test_velocity_curve_linear_between() {
        let curve = VelocityCurve::new(0.0, 100.0, 0.0, 1.0);
        assert!((curve.map(50.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_curve_nonzero_floor() {
        // Rate mapping: still lid plays at 0.8x, fast motion at 1.6x
        let curve = VelocityCurve::new(0.0, 200.0, 0.8, 1.6);
        assert!((curve.map(0.0) - 0.8).abs() < 1e-9);
        assert!((curve.map(200.0) - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_curve_degenerate_span() {
        // saturation at (or below) the deadzone must not produce NaN
        let curve = VelocityCurve::new(180.0, 180.0, 0.0, 1.0);
        assert_eq!(curve.map(100.0), 0.0);
        assert_eq!(curve.map(200.0), 1.0);

        let inverted = VelocityCurve::new(180.0, 10.0, 0.5, 1.5);
        assert_eq!(inverted.map(300.0), 1.5);
        assert!(inverted.map(300.0).is_finite());
    }

    #[test]
    fn test_angle_curve_endpoints() {
        let curve = AngleCurve::new(10.0, 135.0, 220.0, 880.0);
        assert!((curve.map(10.0) - 220.0).abs() < 1e-9);
        assert!((curve.map(135.0) - 880.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_curve_clamps() {
        let curve = AngleCurve::new(10.0, 135.0, 220.0, 880.0);
        assert_eq!(curve.map(0.0), 220.0);
        assert_eq!(curve.map(180.0), 880.0);
    }

    #[test]
    fn test_angle_curve_degenerate_span() {
        let curve = AngleCurve::new(90.0, 90.0, 220.0, 880.0);
        // Zero span maps to the midpoint rather than dividing by zero
        assert!((curve.map(90.0) - 550.0).abs() < 1e-9);
    }
}
