//! Simulated lid motion
//!
//! Sweeps the angle between two bounds with a sinusoidal open/close
//! motion. Used by `record` and anywhere real hardware is unavailable.

use super::{AngleSample, Sensor};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Configuration for the sweep sensor
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Lowest angle of the sweep in degrees
    pub angle_min: f64,
    /// Highest angle of the sweep in degrees
    pub angle_max: f64,
    /// Time for one full open-close cycle
    pub period: Duration,
    /// Interval between emitted samples
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            angle_min: 10.0,
            angle_max: 120.0,
            period: Duration::from_secs(4),
            interval: Duration::from_millis(20),
        }
    }
}

impl SweepConfig {
    /// Create config from settings map
    pub fn from_settings(settings: &HashMap<String, serde_yaml::Value>) -> Self {
        let defaults = Self::default();

        let angle_min = settings
            .get("angle_min")
            .and_then(|v| v.as_f64())
            .unwrap_or(defaults.angle_min);
        let angle_max = settings
            .get("angle_max")
            .and_then(|v| v.as_f64())
            .unwrap_or(defaults.angle_max);
        let period_ms = settings
            .get("period_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.period.as_millis() as u64);
        let interval_ms = settings
            .get("interval_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.interval.as_millis() as u64);

        Self {
            angle_min,
            angle_max,
            period: Duration::from_millis(period_ms.max(1)),
            interval: Duration::from_millis(interval_ms.max(1)),
        }
    }

    /// Angle at a given elapsed time into the sweep
    pub fn angle_at(&self, elapsed: Duration) -> f64 {
        let phase = elapsed.as_secs_f64() / self.period.as_secs_f64();
        let center = (self.angle_min + self.angle_max) / 2.0;
        let amplitude = (self.angle_max - self.angle_min) / 2.0;
        // Start closed-ish and open first
        center - amplitude * (phase * 2.0 * std::f64::consts::PI).cos()
    }
}

/// Sensor that emits a simulated open/close sweep
pub struct SweepSensor {
    name: String,
    config: SweepConfig,
    running: Arc<AtomicBool>,
    sender: broadcast::Sender<AngleSample>,
    task: Option<JoinHandle<()>>,
}

impl SweepSensor {
    /// Create a new sweep sensor
    pub fn new(name: impl Into<String>, config: SweepConfig) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            name: name.into(),
            config,
            running: Arc::new(AtomicBool::new(false)),
            sender,
            task: None,
        }
    }
}

impl Sensor for SweepSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);

        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();

        let task = tokio::spawn(async move {
            let start = Instant::now();

            while running.load(Ordering::SeqCst) {
                let now = Instant::now();
                let sample = AngleSample::at(config.angle_at(now - start), now);

                // Ignore errors if no receivers
                let _ = sender.send(sample);

                tokio::time::sleep(config.interval).await;
            }
        });

        self.task = Some(task);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<AngleSample> {
        self.sender.subscribe()
    }
}

impl Drop for SweepSensor {
    fn drop(&mut self) {
        self.stop();
    }
}
