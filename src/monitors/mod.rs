//! Health evaluation
//!
//! - [`probe`]: runs one check against one endpoint and classifies the outcome
//! - [`cooldown`]: decides whether a failing endpoint should be alerted about now

pub mod cooldown;
pub mod probe;
