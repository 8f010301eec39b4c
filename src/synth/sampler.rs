//! Sample playback
//!
//! `Sample` holds decoded mono audio; `SamplePlayer` plays it back at a
//! variable rate with linear interpolation, looping or one-shot.
//! `SampleBank` loads a directory of WAV files and keeps their names
//! for track listings.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Decoded mono audio data
#[derive(Debug, Clone)]
pub struct Sample {
    /// Display name (file stem for loaded files)
    pub name: String,
    frames: Arc<Vec<f32>>,
    sample_rate: u32,
}

impl Sample {
    /// Create a sample from raw frames
    pub fn from_frames(name: impl Into<String>, frames: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            frames: Arc::new(frames),
            sample_rate,
        }
    }

    /// Load a WAV file, downmixing to mono
    pub fn load(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open WAV file {:?}", path))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("failed to decode {:?}", path))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()
                    .with_context(|| format!("failed to decode {:?}", path))?
            }
        };

        let frames = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        Ok(Self {
            name,
            frames: Arc::new(frames),
            sample_rate: spec.sample_rate,
        })
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the sample holds no audio
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Native sample rate of the audio data
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame(&self, index: usize) -> f32 {
        self.frames.get(index).copied().unwrap_or(0.0)
    }
}

/// Plays a sample at a variable rate
pub struct SamplePlayer {
    sample: Option<Sample>,
    /// Output sample rate
    output_rate: f64,
    /// Fractional read position in source frames
    position: f64,
    /// Playback rate multiplier (1.0 = native pitch)
    rate: f64,
    looping: bool,
    playing: bool,
}

impl SamplePlayer {
    /// Create a player with no sample loaded
    pub fn new(output_rate: f64) -> Self {
        Self {
            sample: None,
            output_rate,
            position: 0.0,
            rate: 1.0,
            looping: false,
            playing: false,
        }
    }

    /// Load a sample into the player, stopping any playback
    pub fn set_sample(&mut self, sample: Sample) {
        self.sample = Some(sample);
        self.position = 0.0;
        self.playing = false;
    }

    /// Whether a sample is loaded
    pub fn has_sample(&self) -> bool {
        self.sample.is_some()
    }

    /// Set looping behavior
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Set the playback rate multiplier
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(0.0);
    }

    /// Start playback from the beginning
    pub fn trigger(&mut self) {
        if self.sample.is_some() {
            self.position = 0.0;
            self.playing = true;
        }
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Whether the player is producing audio
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Generate the next output sample
    pub fn process(&mut self) -> f64 {
        let sample = match (&self.sample, self.playing) {
            (Some(s), true) => s,
            _ => return 0.0,
        };

        let len = sample.len();
        if len == 0 {
            self.playing = false;
            return 0.0;
        }

        // Linear interpolation between adjacent source frames
        let idx = self.position as usize;
        let frac = self.position - idx as f64;
        let a = sample.frame(idx) as f64;
        let b = sample.frame((idx + 1) % len) as f64;
        let out = a + (b - a) * frac;

        // Advance by rate, resampling from source to output rate
        let step = self.rate * sample.sample_rate() as f64 / self.output_rate;
        self.position += step;

        if self.position >= len as f64 {
            if self.looping {
                self.position -= len as f64;
            } else {
                self.playing = false;
            }
        }

        out
    }
}

/// A named collection of samples loaded from a directory
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: Vec<Sample>,
}

impl SampleBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.wav` in a directory, sorted by file name.
    ///
    /// A missing directory yields an empty bank; unreadable files are
    /// skipped with a warning. The engine degrades to silence rather
    /// than failing.
    pub fn load_dir(dir: &Path) -> Self {
        let mut paths: Vec<_> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension()
                        .map(|ext| ext.eq_ignore_ascii_case("wav"))
                        .unwrap_or(false)
                })
                .collect(),
            Err(_) => {
                eprintln!("Warning: sample directory {:?} not found, playing silence", dir);
                return Self::new();
            }
        };
        paths.sort();

        let mut samples = Vec::new();
        for path in paths {
            match Sample::load(&path) {
                Ok(sample) => samples.push(sample),
                Err(e) => eprintln!("Warning: skipping {:?}: {}", path, e),
            }
        }

        Self { samples }
    }

    /// Add a sample to the bank
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of tracks in the bank
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the bank holds no tracks
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get a track by index
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Track names in bank order
    pub fn names(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sine_sample(name: &str, frames: usize, rate: u32) -> Sample {
        let data: Vec<f32> = (0..frames)
            .map(|i| (i as f32 / frames as f32 * std::f32::consts::PI * 2.0).sin())
            .collect();
        Sample::from_frames(name, data, rate)
    }

    fn write_wav(path: &Path, frames: &[f32], rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &f in frames {
            writer.write_sample(f).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_player_silent_without_sample() {
        let mut player = SamplePlayer::new(44100.0);
        player.trigger();
        assert!(!player.is_playing());
        assert_eq!(player.process(), 0.0);
    }

    #[test]
    fn test_player_one_shot_finishes() {
        let mut player = SamplePlayer::new(44100.0);
        player.set_sample(sine_sample("test", 100, 44100));
        player.trigger();
        assert!(player.is_playing());

        for _ in 0..200 {
            player.process();
        }
        assert!(!player.is_playing());
        assert_eq!(player.process(), 0.0);
    }

    #[test]
    fn test_player_looping_continues() {
        let mut player = SamplePlayer::new(44100.0);
        player.set_sample(sine_sample("test", 100, 44100));
        player.set_looping(true);
        player.trigger();

        for _ in 0..1000 {
            player.process();
        }
        assert!(player.is_playing());
    }

    #[test]
    fn test_player_rate_changes_duration() {
        // At 2x rate a 100-frame one-shot ends in ~50 output samples
        let mut player = SamplePlayer::new(44100.0);
        player.set_sample(sine_sample("test", 100, 44100));
        player.set_rate(2.0);
        player.trigger();

        let mut count = 0;
        while player.is_playing() && count < 200 {
            player.process();
            count += 1;
        }
        assert!((45..=55).contains(&count), "ended after {} samples", count);
    }

    #[test]
    fn test_player_resamples_source_rate() {
        // 22050 Hz source through a 44100 Hz player advances at half speed
        let mut player = SamplePlayer::new(44100.0);
        player.set_sample(sine_sample("test", 100, 22050));
        player.trigger();

        let mut count = 0;
        while player.is_playing() && count < 500 {
            player.process();
            count += 1;
        }
        assert!((195..=205).contains(&count), "ended after {} samples", count);
    }

    #[test]
    fn test_sample_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creak.wav");
        let frames: Vec<f32> = vec![0.0, 0.5, -0.5, 0.25];
        write_wav(&path, &frames, 44100);

        let sample = Sample::load(&path).unwrap();
        assert_eq!(sample.name, "creak");
        assert_eq!(sample.len(), 4);
        assert_eq!(sample.sample_rate(), 44100);
    }

    #[test]
    fn test_bank_loads_sorted_and_named() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("b_second.wav"), &[0.0; 10], 44100);
        write_wav(&dir.path().join("a_first.wav"), &[0.0; 10], 44100);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let bank = SampleBank::load_dir(dir.path());
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.names(), vec!["a_first", "b_second"]);
    }

    #[test]
    fn test_bank_missing_dir_is_empty() {
        let bank = SampleBank::load_dir(Path::new("/nonexistent/samples"));
        assert!(bank.is_empty());
    }
}
