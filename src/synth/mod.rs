//! Signal generation for the sound engines
//!
//! Oscillators for synthesized tones, sample playback for recorded
//! material, and the track selection state shared by sample banks.

mod oscillator;
mod sampler;
mod tracks;

pub use oscillator::{Oscillator, Waveform};
pub use sampler::{Sample, SampleBank, SamplePlayer};
pub use tracks::TrackSelector;
