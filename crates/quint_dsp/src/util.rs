//! Level conversion and clipping helpers

/// Gains at or below this level are treated as silence
pub const MINUS_INFINITY_DB: f32 = -100.0;

/// Convert decibels to linear amplitude: 10^(dB/20)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    if db > MINUS_INFINITY_DB {
        10.0_f32.powf(db / 20.0)
    } else {
        0.0
    }
}

/// Convert linear amplitude to decibels, floored at [`MINUS_INFINITY_DB`]
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(MINUS_INFINITY_DB)
    } else {
        MINUS_INFINITY_DB
    }
}

/// Hard clip to the closed range [-1.0, 1.0]
///
/// NaN maps to 0.0 so a bad sample can never escape the range.
#[inline]
pub fn hard_clip(sample: f32) -> f32 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}
