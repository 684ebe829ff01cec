//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while designing filters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },

    #[error("Q must be positive, got {0}")]
    InvalidQ(f32),

    #[error("Linear gain must be positive, got {0}")]
    InvalidGain(f32),
}
