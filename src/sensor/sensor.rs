//! Sensor trait and AngleSample definition

use std::time::Instant;
use tokio::sync::broadcast;

/// A timestamped lid-angle reading in degrees
#[derive(Debug, Clone, Copy)]
pub struct AngleSample {
    /// Lid angle in degrees (0 = closed)
    pub degrees: f64,

    /// When this reading was taken (monotonic clock)
    pub timestamp: Instant,
}

impl AngleSample {
    /// Create a sample stamped with the current time
    pub fn new(degrees: f64) -> Self {
        Self {
            degrees,
            timestamp: Instant::now(),
        }
    }

    /// Create a sample with an explicit timestamp
    pub fn at(degrees: f64, timestamp: Instant) -> Self {
        Self { degrees, timestamp }
    }
}

/// Trait for lid-angle sources
///
/// Real hardware, simulated motion, and trace replay all look the same
/// to the engine: a stream of angle samples on a broadcast channel.
pub trait Sensor: Send + Sync {
    /// Get the name of this sensor
    fn name(&self) -> &str;

    /// Start emitting samples
    fn start(&mut self) -> anyhow::Result<()>;

    /// Stop emitting samples
    fn stop(&mut self);

    /// Check if the sensor is running
    fn is_running(&self) -> bool;

    /// Subscribe to angle samples from this sensor
    fn subscribe(&self) -> broadcast::Receiver<AngleSample>;
}
