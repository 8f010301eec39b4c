//! Lid-angle sensing for Hinge
//!
//! Sensors emit timestamped angle samples; the velocity estimator turns
//! consecutive samples into degrees/second. Real hardware stays behind
//! the `Sensor` trait - the engine only ever sees the sample stream.

mod replay;
mod sensor;
mod sweep;
mod velocity;

pub use replay::{parse_trace, ReplayConfig, ReplaySensor, TraceError, TracePoint};
pub use sensor::{AngleSample, Sensor};
pub use sweep::{SweepConfig, SweepSensor};
pub use velocity::VelocityEstimator;
