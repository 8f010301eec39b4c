//! Hinge - laptop lid sonification
//!
//! Turns lid movement into sound. The lid angle and the speed of the
//! hinge drive a sound engine: a creak that follows the motion, a
//! theremin pitched by the angle, or sample banks fired by fast flicks.

pub mod config;
pub mod sensor;
pub mod mapping;
pub mod modes;
pub mod synth;
pub mod engine;
pub mod viz;

pub use config::HingeConfig;
pub use engine::SoundManager;
pub use modes::SoundMode;
