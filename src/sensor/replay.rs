//! Trace replay sensor
//!
//! Replays a recorded lid-angle trace: one `millis,degrees` pair per
//! line, comments starting with `#`. Timestamps are relative to the
//! start of the trace and replayed with real-time pacing.

use super::{AngleSample, Sensor};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Errors while parsing a trace file
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: expected 'millis,degrees', got '{text}'")]
    Malformed { line: usize, text: String },

    #[error("line {line}: timestamps must not decrease ({prev}ms then {cur}ms)")]
    NonMonotonic { line: usize, prev: u64, cur: u64 },

    #[error("trace contains no samples")]
    Empty,
}

/// One entry of a parsed trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub offset: Duration,
    pub degrees: f64,
}

/// Parse a trace from text
pub fn parse_trace(text: &str) -> Result<Vec<TracePoint>, TraceError> {
    let mut points = Vec::new();
    let mut prev_ms: Option<u64> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.splitn(2, ',');
        let parsed = match (fields.next(), fields.next()) {
            (Some(ms), Some(deg)) => ms
                .trim()
                .parse::<u64>()
                .ok()
                .zip(deg.trim().parse::<f64>().ok()),
            _ => None,
        };

        let (ms, degrees) = parsed.ok_or_else(|| TraceError::Malformed {
            line,
            text: trimmed.to_string(),
        })?;

        if let Some(prev) = prev_ms {
            if ms < prev {
                return Err(TraceError::NonMonotonic {
                    line,
                    prev,
                    cur: ms,
                });
            }
        }
        prev_ms = Some(ms);

        points.push(TracePoint {
            offset: Duration::from_millis(ms),
            degrees,
        });
    }

    if points.is_empty() {
        return Err(TraceError::Empty);
    }
    Ok(points)
}

/// Configuration for the replay sensor
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Path to the trace file
    pub path: PathBuf,
    /// Loop the trace when it ends
    pub repeat: bool,
}

impl ReplayConfig {
    /// Create config from settings map
    pub fn from_settings(settings: &HashMap<String, serde_yaml::Value>) -> Result<Self> {
        let path = settings
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .context("replay sensor requires 'path' setting")?;

        let repeat = settings
            .get("repeat")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(Self { path, repeat })
    }
}

/// Sensor that replays a recorded trace file
pub struct ReplaySensor {
    name: String,
    config: ReplayConfig,
    running: Arc<AtomicBool>,
    sender: broadcast::Sender<AngleSample>,
    task: Option<JoinHandle<()>>,
}

impl ReplaySensor {
    /// Create a new replay sensor
    pub fn new(name: impl Into<String>, config: ReplayConfig) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            name: name.into(),
            config,
            running: Arc::new(AtomicBool::new(false)),
            sender,
            task: None,
        }
    }

    fn load_trace(path: &Path) -> Result<Vec<TracePoint>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trace file {:?}", path))?;
        let points = parse_trace(&text)
            .with_context(|| format!("failed to parse trace file {:?}", path))?;
        Ok(points)
    }
}

impl Sensor for ReplaySensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }

        // Fail on start rather than in the task so the caller sees it
        let points = Self::load_trace(&self.config.path)?;

        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();
        let repeat = self.config.repeat;

        let task = tokio::spawn(async move {
            loop {
                let start = Instant::now();

                for point in &points {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }

                    // Pace against the trace clock
                    let due = start + point.offset;
                    let now = Instant::now();
                    if due > now {
                        tokio::time::sleep(due - now).await;
                    }

                    let _ = sender.send(AngleSample::at(point.degrees, Instant::now()));
                }

                if !repeat {
                    running.store(false, Ordering::SeqCst);
                    return;
                }
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

impl Drop for ReplaySensor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_trace_basic() {
        let points = parse_trace("0,10.0\n20,11.5\n40,13.0\n").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].offset, Duration::from_millis(20));
        assert_eq!(points[1].degrees, 11.5);
    }

    #[test]
    fn test_parse_trace_skips_comments_and_blanks() {
        let points = parse_trace("# lid open\n\n0,10\n10,20\n").unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_parse_trace_malformed_line() {
        let err = parse_trace("0,10\nnot a line\n").unwrap_err();
        match err {
            TraceError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_trace_rejects_decreasing_time() {
        let err = parse_trace("100,10\n50,20\n").unwrap_err();
        assert!(matches!(err, TraceError::NonMonotonic { .. }));
    }

    #[test]
    fn test_parse_trace_empty() {
        assert!(matches!(parse_trace("# only comments\n"), Err(TraceError::Empty)));
    }

    #[tokio::test]
    async fn test_replay_sensor_missing_file() {
        let mut sensor = ReplaySensor::new(
            "test_replay",
            ReplayConfig {
                path: PathBuf::from("/nonexistent/trace.csv"),
                repeat: false,
            },
        );
        assert!(sensor.start().is_err());
        assert!(!sensor.is_running());
    }

    #[tokio::test]
    async fn test_replay_sensor_emits_trace() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0,30.0").unwrap();
        writeln!(file, "5,40.0").unwrap();
        file.flush().unwrap();

        let mut sensor = ReplaySensor::new(
            "test_replay",
            ReplayConfig {
                path: file.path().to_path_buf(),
                repeat: false,
            },
        );
        let mut rx = sensor.subscribe();
        sensor.start().unwrap();

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timeout")
            .expect("receive error");
        assert_eq!(first.degrees, 30.0);

        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timeout")
            .expect("receive error");
        assert_eq!(second.degrees, 40.0);

        sensor.stop();
    }
}
