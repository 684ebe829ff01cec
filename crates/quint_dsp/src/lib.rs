//! Quint DSP - Digital Signal Processing Primitives
//!
//! Building blocks for the Quint equalizer's audio path:
//! - Second-order filter stages (low-pass, high-pass, peaking) on `biquad`
//! - Linear gain smoothing for click-free level changes
//! - Lock-free peak metering readable from any thread
//! - dB conversion and hard clipping helpers
//!
//! # Architecture
//!
//! Nothing in this crate allocates or locks once constructed. Coefficients
//! are designed off the sample path and swapped in wholesale between blocks.

mod error;
mod filter;
mod meter;
mod smoother;
mod util;

pub use error::DspError;
pub use filter::{design, identity_coefficients, FilterCoefficients, FilterKind, FilterStage};
pub use meter::{LevelMeter, MeterReading};
pub use smoother::GainSmoother;
pub use util::{db_to_gain, gain_to_db, hard_clip, MINUS_INFINITY_DB};
