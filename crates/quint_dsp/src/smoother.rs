//! Linear Gain Smoother
//!
//! Ramps a scalar gain toward its target over a fixed number of samples so
//! output level changes never produce a step in the waveform.

/// Linearly ramped scalar, advanced once per sample
#[derive(Debug, Clone, Copy)]
pub struct GainSmoother {
    current: f32,
    target: f32,
    step: f32,
    /// Samples left in the active ramp
    countdown: u32,
    /// Ramp duration in samples, fixed by `reset`
    ramp_length: u32,
}

impl GainSmoother {
    /// Create a smoother resting at `initial`. The ramp length is zero until
    /// [`reset`](Self::reset) is called with a sample rate.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            countdown: 0,
            ramp_length: 0,
        }
    }

    /// Fix the ramp duration for `sample_rate` and come to rest at the latest
    /// target.
    ///
    /// Any ramp in flight is dropped. The result depends only on the sample
    /// rate and the most recent target, never on the path taken to reach it,
    /// so a smoother reset here matches one freshly built at that target.
    pub fn reset(&mut self, sample_rate: f32, ramp_seconds: f32) {
        let samples = (ramp_seconds * sample_rate).round();
        self.ramp_length = if samples.is_finite() && samples > 0.0 {
            samples as u32
        } else {
            0
        };
        self.set_current_and_target(self.target);
    }

    /// Jump straight to `value` without ramping
    pub fn set_current_and_target(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.countdown = 0;
    }

    /// Start ramping toward `value`. The current value is left where it is.
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }
        if self.ramp_length == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.target = value;
        self.countdown = self.ramp_length;
        // Re-targeting mid-ramp restarts from the current value
        self.step = (self.target - self.current) / self.countdown as f32;
    }

    /// Advance one sample and return the new value
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.countdown == 0 {
            return self.target;
        }

        self.countdown -= 1;
        if self.countdown == 0 {
            // Land exactly on target, whatever rounding accumulated
            self.current = self.target;
        } else {
            self.current += self.step;
        }
        self.current
    }

    /// Advance `samples` steps without reading the intermediate values
    pub fn skip(&mut self, samples: u32) {
        if samples >= self.countdown {
            self.current = self.target;
            self.countdown = 0;
        } else {
            self.current += self.step * samples as f32;
            self.countdown -= samples;
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn ramp_length(&self) -> u32 {
        self.ramp_length
    }

    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }
}

impl Default for GainSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramped(sample_rate: f32) -> GainSmoother {
        let mut smoother = GainSmoother::new(1.0);
        smoother.reset(sample_rate, 0.010);
        smoother
    }

    #[test]
    fn test_ramp_length_from_sample_rate() {
        assert_eq!(ramped(44100.0).ramp_length(), 441);
        assert_eq!(ramped(48000.0).ramp_length(), 480);
        assert_eq!(ramped(96000.0).ramp_length(), 960);
    }

    #[test]
    fn test_set_target_keeps_current() {
        let mut smoother = ramped(48000.0);
        smoother.set_target(0.1);

        assert_eq!(smoother.current(), 1.0);
        assert_eq!(smoother.target(), 0.1);
        assert!(smoother.is_smoothing());
    }

    #[test]
    fn test_reaches_target_after_ramp() {
        let mut smoother = ramped(44100.0);
        smoother.set_target(0.1);

        let mut last = 1.0_f32;
        for i in 0..smoother.ramp_length() {
            let value = smoother.next_value();
            assert!(value <= last, "not monotonic at {}: {} > {}", i, value, last);
            assert!(value >= 0.1);
            last = value;
        }

        assert_eq!(last, 0.1);
        assert!(!smoother.is_smoothing());
        // Holds at target afterwards
        assert_eq!(smoother.next_value(), 0.1);
    }

    #[test]
    fn test_first_step_is_one_increment() {
        let mut smoother = ramped(44100.0);
        smoother.set_target(0.0);

        let first = smoother.next_value();
        let increment = 1.0 / 441.0;
        assert!((1.0 - first - increment).abs() < 1e-6);
    }

    #[test]
    fn test_rapid_retarget_is_bounded() {
        let mut smoother = ramped(48000.0);
        let max_step = 1.0 / smoother.ramp_length() as f32 + 1e-6;

        let mut last = smoother.current();
        for i in 0..2000 {
            // Flip the target every few samples
            if i % 7 == 0 {
                smoother.set_target(if (i / 7) % 2 == 0 { 0.0 } else { 1.0 });
            }
            let value = smoother.next_value();
            assert!((value - last).abs() <= max_step, "jump at sample {}", i);
            last = value;
        }
    }

    #[test]
    fn test_same_target_does_not_restart() {
        let mut smoother = ramped(48000.0);
        smoother.set_target(0.5);
        for _ in 0..100 {
            smoother.next_value();
        }
        let mid = smoother.current();

        smoother.set_target(0.5);
        let next = smoother.next_value();
        let expected_step = (0.5 - 1.0) / 480.0;
        assert!((next - (mid + expected_step)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_ramp_jumps() {
        let mut smoother = GainSmoother::new(0.0);
        smoother.set_target(0.7);
        assert_eq!(smoother.current(), 0.7);
        assert_eq!(smoother.next_value(), 0.7);
    }

    #[test]
    fn test_reset_snaps_to_target() {
        let mut smoother = ramped(48000.0);
        smoother.set_target(0.25);
        smoother.next_value();

        smoother.reset(48000.0, 0.010);
        assert_eq!(smoother.current(), 0.25);
        assert!(!smoother.is_smoothing());
    }

    #[test]
    fn test_reset_rests_at_latest_target() {
        let mut smoother = GainSmoother::new(1.0);
        smoother.reset(48000.0, 0.010);
        smoother.set_target(0.25);

        smoother.reset(48000.0, 0.010);
        assert_eq!(smoother.current(), 0.25);
        assert_eq!(smoother.next_value(), 0.25);
        assert!(!smoother.is_smoothing());
    }

    #[test]
    fn test_reset_is_independent_of_history() {
        let mut fresh = GainSmoother::new(0.5);
        fresh.reset(48000.0, 0.010);

        // Different starting value, left mid-ramp toward the same target
        let mut used = GainSmoother::new(0.1);
        used.reset(44100.0, 0.010);
        for i in 0..300 {
            used.set_target(if i % 50 < 25 { 0.9 } else { 0.3 });
            used.next_value();
        }
        used.set_target(0.5);
        for _ in 0..17 {
            used.next_value();
        }
        assert!(used.is_smoothing());
        used.reset(48000.0, 0.010);

        assert_eq!(fresh.ramp_length(), used.ramp_length());
        for _ in 0..10 {
            assert_eq!(fresh.next_value(), used.next_value());
        }

        // Both ramp identically from here
        fresh.set_target(0.8);
        used.set_target(0.8);
        for _ in 0..fresh.ramp_length() {
            assert_eq!(fresh.next_value(), used.next_value());
        }
        assert_eq!(fresh.current(), used.current());
    }

    #[test]
    fn test_skip_advances_ramp() {
        let mut a = ramped(48000.0);
        let mut b = ramped(48000.0);
        a.set_target(0.0);
        b.set_target(0.0);

        for _ in 0..100 {
            a.next_value();
        }
        b.skip(100);
        assert!((a.current() - b.current()).abs() < 1e-5);

        b.skip(10_000);
        assert_eq!(b.current(), 0.0);
        assert!(!b.is_smoothing());
    }
}
