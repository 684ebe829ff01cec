//! Quint Core - Five-Band Equalizer Engine
//!
//! This crate provides the real-time core of the Quint equalizer:
//! - Static parameter layout and a lock-free parameter store
//! - Coefficient update protocol (snapshot -> filter coefficients)
//! - Block processor with activation gating, smoothed output gain,
//!   hard clipping and peak metering
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Parameter Thread                         │
//! │     host/UI ──set()──▶ EqParameters ──▶ dirty flag (atomic) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ snapshot at next block
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   EqDesign::from_snapshot ──▶ EqProcessor::process_block    │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ atomic f32
//!                              ▼
//!                    LevelMeter ◀── UI reads
//! ```

mod config;
mod error;
mod params;
mod processor;
mod update;

pub use config::{
    is_layout_supported, ProcessSpec, BAND_COUNT, MAX_CHANNELS, OUTPUT_GAIN_RAMP_SECONDS,
};
pub use error::{CoreError, CoreResult};
pub use params::{EqParameters, ParamId, ParamSpec, ParameterSnapshot, PARAMS, PARAM_COUNT};
pub use processor::{ActivationState, AudioProcessor, EqProcessor};
pub use update::{clamp_frequency, Band, EqDesign, MAX_FREQUENCY_RATIO, MIN_FREQUENCY_HZ, MIN_Q};

// Re-export DSP types for convenience
pub use quint_dsp::{FilterCoefficients, FilterKind, LevelMeter, MeterReading};
