//! Processing Configuration

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Number of filter bands per channel
pub const BAND_COUNT: usize = 5;

/// Channels the processor can hold filter state for
pub const MAX_CHANNELS: usize = 2;

/// Output gain ramp duration
pub const OUTPUT_GAIN_RAMP_SECONDS: f32 = 0.010;

/// Stream parameters handed to `prepare`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: f32,

    /// Expected block size in frames. A hint only: blocks of any length process.
    pub block_size: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 512,
            channels: 2,
        }
    }
}

impl ProcessSpec {
    /// Stereo spec for the given rate and block size hint
    pub fn stereo(sample_rate: f32, block_size: u32) -> Self {
        Self {
            sample_rate,
            block_size,
            channels: 2,
        }
    }

    /// Calculate latency in milliseconds for one block
    pub fn latency_ms(&self) -> f32 {
        (self.block_size as f32 / self.sample_rate) * 1000.0
    }

    /// Validate configuration
    ///
    /// Any finite positive sample rate is accepted; band frequencies are
    /// clamped below Nyquist when coefficients are designed. The block size
    /// is never checked.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(CoreError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels == 0 || self.channels as usize > MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(self.channels as usize));
        }
        Ok(())
    }
}

/// Mono or stereo, with matching input and output channel counts
pub fn is_layout_supported(input_channels: usize, output_channels: usize) -> bool {
    (1..=MAX_CHANNELS).contains(&output_channels) && input_channels == output_channels
}
