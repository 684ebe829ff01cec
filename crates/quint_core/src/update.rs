//! Coefficient Update Protocol
//!
//! Turns a parameter snapshot into the concrete filter coefficients and
//! output gain target for one sample rate. A pure function: no state beyond
//! its arguments, so it can run on the audio thread between blocks.

use quint_dsp::{db_to_gain, design, DspError, FilterCoefficients, FilterKind};

use crate::config::BAND_COUNT;
use crate::params::{ParamId, ParameterSnapshot};

/// Lowest frequency handed to the design formulas
pub const MIN_FREQUENCY_HZ: f32 = 1.0;

/// Highest frequency as a fraction of the sample rate, just below Nyquist
pub const MAX_FREQUENCY_RATIO: f32 = 0.49;

/// Smallest Q handed to the design formulas
pub const MIN_Q: f32 = 0.1;

/// Filter bands in processing order
///
/// The order is fixed: each stage feeds the next, and output must be
/// reproducible sample for sample across hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    LowPass,
    HighPass,
    LowMid,
    Mid,
    HighMid,
}

impl Band {
    pub const ALL: [Band; BAND_COUNT] = [
        Band::LowPass,
        Band::HighPass,
        Band::LowMid,
        Band::Mid,
        Band::HighMid,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Frequency parameter driving this band
    pub fn frequency_param(self) -> ParamId {
        match self {
            Band::LowPass => ParamId::LowPassFrequency,
            Band::HighPass => ParamId::HighPassFrequency,
            Band::LowMid => ParamId::LowMidFrequency,
            Band::Mid => ParamId::MidFrequency,
            Band::HighMid => ParamId::HighMidFrequency,
        }
    }

    pub fn q_param(self) -> ParamId {
        match self {
            Band::LowPass => ParamId::LowPassQ,
            Band::HighPass => ParamId::HighPassQ,
            Band::LowMid => ParamId::LowMidQ,
            Band::Mid => ParamId::MidQ,
            Band::HighMid => ParamId::HighMidQ,
        }
    }

    /// Gain parameter in dB, for the peaking bands only
    pub fn gain_param(self) -> Option<ParamId> {
        match self {
            Band::LowPass | Band::HighPass => None,
            Band::LowMid => Some(ParamId::LowMidGain),
            Band::Mid => Some(ParamId::MidGain),
            Band::HighMid => Some(ParamId::HighMidGain),
        }
    }

    /// Filter shape for this band given the current snapshot
    pub fn kind(self, snapshot: &ParameterSnapshot) -> FilterKind {
        match self {
            Band::LowPass => FilterKind::LowPass,
            Band::HighPass => FilterKind::HighPass,
            Band::LowMid | Band::Mid | Band::HighMid => FilterKind::Peaking {
                gain: self
                    .gain_param()
                    .map_or(1.0, |param| db_to_gain(snapshot.get(param))),
            },
        }
    }
}

/// Keep a frequency inside the range the design formulas handle at `sample_rate`
///
/// Below 2 Hz sample rates the Nyquist bound wins over [`MIN_FREQUENCY_HZ`].
#[inline]
pub fn clamp_frequency(frequency: f32, sample_rate: f32) -> f32 {
    let max = sample_rate * MAX_FREQUENCY_RATIO;
    let min = MIN_FREQUENCY_HZ.min(max);
    // max/min rather than clamp: a NaN rate must not panic here
    frequency.max(min).min(max)
}

/// Everything the processor derives from one parameter snapshot
///
/// Both channels use identical settings, so one coefficient set per band
/// and one gain target are fanned out to every channel.
#[derive(Debug, Clone, Copy)]
pub struct EqDesign {
    /// Coefficients in [`Band::ALL`] order
    pub bands: [FilterCoefficients; BAND_COUNT],
    /// Linear output gain target
    pub output_gain: f32,
}

impl EqDesign {
    /// Compute coefficients and output gain for `snapshot` at `sample_rate`
    ///
    /// Frequencies are clamped below Nyquist and Q is floored, so for any
    /// positive sample rate the design cannot produce NaN or unstable poles.
    pub fn from_snapshot(
        snapshot: &ParameterSnapshot,
        sample_rate: f32,
    ) -> Result<Self, DspError> {
        let mut bands = [quint_dsp::identity_coefficients(); BAND_COUNT];
        for band in Band::ALL {
            let frequency = clamp_frequency(snapshot.get(band.frequency_param()), sample_rate);
            let q = snapshot.get(band.q_param()).max(MIN_Q);
            bands[band.index()] = design(band.kind(snapshot), sample_rate, frequency, q)?;
        }

        Ok(Self {
            bands,
            output_gain: db_to_gain(snapshot.get(ParamId::OutputGain)),
        })
    }

    #[inline]
    pub fn band(&self, band: Band) -> FilterCoefficients {
        self.bands[band.index()]
    }
}
