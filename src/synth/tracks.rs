//! Track selection state
//!
//! Track-based engines pick which sample to fire per trigger: uniform
//! random over the bank, unless the user has pinned a specific index.
//! Pinning persists until an explicit reset.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Chooses the track to play for each trigger
pub struct TrackSelector {
    pinned: Option<usize>,
    rng: SmallRng,
}

impl TrackSelector {
    /// Create a selector in random mode
    pub fn new() -> Self {
        Self {
            pinned: None,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create a selector with a fixed RNG seed (deterministic, for tests)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            pinned: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Pin a specific track index. Returns false if the index is out of
    /// range for a bank of `track_count` tracks, leaving the mode unchanged.
    pub fn pin(&mut self, index: usize, track_count: usize) -> bool {
        if index < track_count {
            self.pinned = Some(index);
            true
        } else {
            false
        }
    }

    /// Clear the pin, reverting to random selection
    pub fn reset(&mut self) {
        self.pinned = None;
    }

    /// Whether a track is currently pinned
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Pick the track for the next trigger. Returns None for an empty bank.
    ///
    /// A stale pin (bank shrank underneath it) falls back to random
    /// rather than going silent.
    pub fn pick(&mut self, track_count: usize) -> Option<usize> {
        if track_count == 0 {
            return None;
        }
        match self.pinned {
            Some(index) if index < track_count => Some(index),
            _ => Some(self.rng.gen_range(0..track_count)),
        }
    }
}

impl Default for TrackSelector {
    fn default() -> Self {
        Self::new()
    }
}
