//! Mapping from the sensor signal to audio parameters
//!
//! The ramp filter smooths parameter changes; the response curves decide
//! what the parameters should be.

mod ramp;
mod response;

pub use ramp::{ramp, Smoother};
pub use response::{AngleCurve, VelocityCurve};
