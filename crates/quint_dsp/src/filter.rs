//! Second-Order Filter Stage
//!
//! Closed-form biquad design plus a single filter instance with its own
//! delay state. Coefficients follow the RBJ (Robert Bristow-Johnson) Audio
//! EQ Cookbook via the `biquad` crate.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type};

use crate::error::DspError;
use crate::util::gain_to_db;

/// Normalised second-order transfer function (a0 is implicitly 1)
pub type FilterCoefficients = Coefficients<f32>;

/// Response shape of a filter stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    /// Boost or cut around the centre frequency. `gain` is linear, not dB.
    Peaking { gain: f32 },
}

/// Design coefficients for `kind` at the given frequency and Q.
///
/// Callers are expected to clamp inputs beforehand. Out-of-range values are
/// reported as errors instead of producing unstable coefficients.
pub fn design(
    kind: FilterKind,
    sample_rate: f32,
    frequency: f32,
    q: f32,
) -> Result<FilterCoefficients, DspError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(DspError::InvalidSampleRate(sample_rate));
    }
    let out_of_range = DspError::InvalidCoefficients {
        frequency,
        sample_rate,
    };
    if !frequency.is_finite() || frequency <= 0.0 || frequency >= sample_rate * 0.5 {
        return Err(out_of_range);
    }
    if !q.is_finite() || q <= 0.0 {
        return Err(DspError::InvalidQ(q));
    }

    let filter_type = match kind {
        FilterKind::LowPass => Type::LowPass,
        FilterKind::HighPass => Type::HighPass,
        FilterKind::Peaking { gain } => {
            if !gain.is_finite() || gain <= 0.0 {
                return Err(DspError::InvalidGain(gain));
            }
            // biquad takes the peaking gain in dB
            Type::PeakingEQ(gain_to_db(gain))
        }
    };

    let fs = Hertz::<f32>::from_hz(sample_rate)
        .map_err(|_| DspError::InvalidSampleRate(sample_rate))?;
    let f0 = Hertz::<f32>::from_hz(frequency).map_err(|_| out_of_range.clone())?;

    Coefficients::<f32>::from_params(filter_type, fs, f0, q).map_err(|_| out_of_range)
}

/// Coefficients that leave the signal untouched
pub fn identity_coefficients() -> FilterCoefficients {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// One biquad instance: a coefficient set and its two delay registers
///
/// Each (band, channel) pair owns its own stage; state is never shared.
pub struct FilterStage {
    // Transposed direct form II keeps the state in two registers
    filter: DirectForm2Transposed<f32>,
    coefficients: FilterCoefficients,
}

impl FilterStage {
    pub fn new(coefficients: FilterCoefficients) -> Self {
        Self {
            filter: DirectForm2Transposed::<f32>::new(coefficients),
            coefficients,
        }
    }

    /// Stage with identity coefficients and cleared state
    pub fn passthrough() -> Self {
        Self::new(identity_coefficients())
    }

    pub fn coefficients(&self) -> FilterCoefficients {
        self.coefficients
    }

    /// Replace the coefficient set wholesale. Delay state is kept so the
    /// signal stays continuous across parameter changes.
    pub fn set_coefficients(&mut self, coefficients: FilterCoefficients) {
        self.filter.update_coefficients(coefficients);
        self.coefficients = coefficients;
    }

    /// Run one sample through the difference equation
    ///
    /// # Real-time Safety
    /// No allocations, O(1).
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        self.filter.run(sample)
    }

    /// Filter a buffer in place
    #[inline]
    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.filter.run(*sample);
        }
    }

    /// Zero both delay registers
    ///
    /// Call on sample-rate changes and transport stops, otherwise stale state
    /// from the previous regime leaks into new audio as clicks.
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::passthrough()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// (b0, b1, b2, a1, a2) computed in f64 from the bilinear-transform formulas
    type Reference = [f64; 5];

    fn reference_low_pass(sr: f64, freq: f64, q: f64) -> Reference {
        let n = 1.0 / (PI * freq / sr).tan();
        let n2 = n * n;
        let c1 = 1.0 / (1.0 + n / q + n2);
        [c1, 2.0 * c1, c1, 2.0 * c1 * (1.0 - n2), c1 * (1.0 - n / q + n2)]
    }

    fn reference_high_pass(sr: f64, freq: f64, q: f64) -> Reference {
        let n = (PI * freq / sr).tan();
        let n2 = n * n;
        let c1 = 1.0 / (1.0 + n / q + n2);
        [c1, -2.0 * c1, c1, 2.0 * c1 * (n2 - 1.0), c1 * (1.0 - n / q + n2)]
    }

    fn reference_peak(sr: f64, freq: f64, q: f64, gain: f64) -> Reference {
        let a = gain.sqrt();
        let omega = 2.0 * PI * freq / sr;
        let alpha = omega.sin() / (2.0 * q);
        let c2 = -2.0 * omega.cos();
        let a0 = 1.0 + alpha / a;
        [
            (1.0 + alpha * a) / a0,
            c2 / a0,
            (1.0 - alpha * a) / a0,
            c2 / a0,
            (1.0 - alpha / a) / a0,
        ]
    }

    fn reference_impulse(coeffs: Reference, len: usize) -> Vec<f64> {
        let [b0, b1, b2, a1, a2] = coeffs;
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        (0..len)
            .map(|i| {
                let x = if i == 0 { 1.0 } else { 0.0 };
                let y = b0 * x + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;
                x2 = x1;
                x1 = x;
                y2 = y1;
                y1 = y;
                y
            })
            .collect()
    }

    fn stage_impulse(stage: &mut FilterStage, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| stage.process(if i == 0 { 1.0 } else { 0.0 }))
            .collect()
    }

    fn assert_impulse_matches(kind: FilterKind, reference: Reference, freq: f32, q: f32) {
        let coeffs = design(kind, 48000.0, freq, q).unwrap();
        let mut stage = FilterStage::new(coeffs);

        let expected = reference_impulse(reference, 64);
        let actual = stage_impulse(&mut stage, 64);

        for (i, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
            assert!(
                (*e - *a as f64).abs() < 1e-5,
                "{:?} sample {}: expected {}, got {}",
                kind,
                i,
                e,
                a
            );
        }
    }

    #[test]
    fn test_low_pass_impulse_response() {
        assert_impulse_matches(
            FilterKind::LowPass,
            reference_low_pass(48000.0, 1000.0, 0.707),
            1000.0,
            0.707,
        );
        assert_impulse_matches(
            FilterKind::LowPass,
            reference_low_pass(48000.0, 5000.0, 2.0),
            5000.0,
            2.0,
        );
    }

    #[test]
    fn test_high_pass_impulse_response() {
        assert_impulse_matches(
            FilterKind::HighPass,
            reference_high_pass(48000.0, 1000.0, 1.0),
            1000.0,
            1.0,
        );
    }

    #[test]
    fn test_peaking_impulse_response() {
        // +6 dB and -12 dB
        for gain in [1.995_262_3_f32, 0.251_188_64] {
            assert_impulse_matches(
                FilterKind::Peaking { gain },
                reference_peak(48000.0, 1000.0, 1.0, gain as f64),
                1000.0,
                1.0,
            );
        }
    }

    #[test]
    fn test_peaking_steady_state_gain() {
        let sample_rate = 48000.0_f32;
        let freq = 1000.0_f32;

        for gain_db in [6.0_f32, -12.0, 18.0] {
            let gain = crate::db_to_gain(gain_db);
            let coeffs = design(FilterKind::Peaking { gain }, sample_rate, freq, 1.0).unwrap();
            let mut stage = FilterStage::new(coeffs);

            let amplitude = 0.25_f32;
            let mut peak = 0.0_f32;
            for i in 0..48000 {
                let t = i as f32 / sample_rate;
                let x = amplitude * (2.0 * std::f32::consts::PI * freq * t).sin();
                let y = stage.process(x);
                // Only measure once the transient has died away
                if i >= 43200 {
                    peak = peak.max(y.abs());
                }
            }

            let expected = amplitude * gain;
            assert!(
                (peak / expected - 1.0).abs() < 0.01,
                "{} dB: expected {}, measured {}",
                gain_db,
                expected,
                peak
            );
        }
    }

    #[test]
    fn test_zero_db_peaking_is_transparent() {
        let coeffs = design(FilterKind::Peaking { gain: 1.0 }, 44100.0, 800.0, 1.0).unwrap();
        let mut stage = FilterStage::new(coeffs);

        for i in 0..256 {
            let x = ((i * 7) % 13) as f32 / 13.0 - 0.5;
            assert!((stage.process(x) - x).abs() < 1e-5);
        }
    }

    #[test]
    fn test_reset_restores_initial_response() {
        let coeffs = design(FilterKind::LowPass, 44100.0, 2000.0, 1.0).unwrap();
        let mut fresh = FilterStage::new(coeffs);
        let mut used = FilterStage::new(coeffs);

        for i in 0..500 {
            used.process(((i as f32) * 0.37).sin());
        }
        used.reset();
        // Reset twice: must be idempotent
        used.reset();

        assert_eq!(stage_impulse(&mut fresh, 32), stage_impulse(&mut used, 32));
    }

    #[test]
    fn test_set_coefficients_replaces_set() {
        let mut stage = FilterStage::passthrough();
        assert_eq!(stage.coefficients().b0, 1.0);

        let lpf = design(FilterKind::LowPass, 48000.0, 500.0, 0.707).unwrap();
        stage.set_coefficients(lpf);
        assert_eq!(stage.coefficients().b0, lpf.b0);
        assert_eq!(stage.coefficients().a2, lpf.a2);
    }

    #[test]
    fn test_passthrough_stage() {
        let mut stage = FilterStage::default();
        let mut buffer = [0.5, -0.25, 0.75, 0.0];
        stage.process_buffer(&mut buffer);
        assert_eq!(buffer, [0.5, -0.25, 0.75, 0.0]);
    }

    #[test]
    fn test_design_rejects_invalid_input() {
        assert!(matches!(
            design(FilterKind::LowPass, 0.0, 1000.0, 1.0),
            Err(DspError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            design(FilterKind::LowPass, 44100.0, 22050.0, 1.0),
            Err(DspError::InvalidCoefficients { .. })
        ));
        assert!(matches!(
            design(FilterKind::HighPass, 44100.0, -5.0, 1.0),
            Err(DspError::InvalidCoefficients { .. })
        ));
        assert!(matches!(
            design(FilterKind::HighPass, 44100.0, 1000.0, 0.0),
            Err(DspError::InvalidQ(_))
        ));
        assert!(matches!(
            design(FilterKind::Peaking { gain: 0.0 }, 44100.0, 1000.0, 1.0),
            Err(DspError::InvalidGain(_))
        ));
    }

    #[test]
    fn test_low_pass_is_stable_near_nyquist() {
        let coeffs = design(FilterKind::LowPass, 44100.0, 21800.0, 20.0).unwrap();
        let mut stage = FilterStage::new(coeffs);

        for i in 0..10000 {
            let y = stage.process(if i % 2 == 0 { 1.0 } else { -1.0 });
            assert!(y.is_finite());
        }
    }
}
