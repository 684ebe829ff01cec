//! Core Error Types

use thiserror::Error;

/// Errors surfaced by the processor's control path
///
/// None of these are produced on the audio thread: configuration problems
/// are rejected at prepare time, parameter values are clamped on entry.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid sample rate: {0}Hz")]
    InvalidSampleRate(f32),

    #[error("Invalid channel count: {0} (supported: 1-2)")]
    InvalidChannelCount(usize),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("DSP error: {0}")]
    Dsp(#[from] quint_dsp::DspError),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
