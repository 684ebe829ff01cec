//! Parameter Layout and Store
//!
//! The layout is static data: every parameter's key, range, default and
//! skew. The store holds the live values as atomics so the parameter thread
//! can write while the audio thread takes snapshots, and raises the dirty
//! flag whenever a value actually changes.
//!
//! # Memory Ordering
//!
//! Values are written `Relaxed`, then the dirty flag is raised with
//! `Release`. The processor consumes the flag with an `AcqRel` swap before
//! reading values, so it always sees at least the values that were stored
//! before the flag it observed.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::CoreError;

/// Number of parameters in the layout
pub const PARAM_COUNT: usize = 14;

/// Identifier of every automatable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    LowPassFrequency,
    LowPassQ,
    HighPassFrequency,
    HighPassQ,
    LowMidFrequency,
    LowMidQ,
    LowMidGain,
    MidFrequency,
    MidQ,
    MidGain,
    HighMidFrequency,
    HighMidQ,
    HighMidGain,
    OutputGain,
}

impl ParamId {
    /// All parameters, in layout order
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::LowPassFrequency,
        ParamId::LowPassQ,
        ParamId::HighPassFrequency,
        ParamId::HighPassQ,
        ParamId::LowMidFrequency,
        ParamId::LowMidQ,
        ParamId::LowMidGain,
        ParamId::MidFrequency,
        ParamId::MidQ,
        ParamId::MidGain,
        ParamId::HighMidFrequency,
        ParamId::HighMidQ,
        ParamId::HighMidGain,
        ParamId::OutputGain,
    ];

    /// Position in the layout and in snapshots
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Static description of this parameter
    #[inline]
    pub fn spec(self) -> &'static ParamSpec {
        &PARAMS[self.index()]
    }

    /// Stable string key used by hosts and persisted state
    pub fn key(self) -> &'static str {
        self.spec().key
    }
}

impl FromStr for ParamId {
    type Err = CoreError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        ParamId::ALL
            .iter()
            .copied()
            .find(|id| id.key() == key)
            .ok_or_else(|| CoreError::UnknownParameter(key.to_string()))
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Range, default and display data for one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: &'static str,
    /// Snapping step, 0.0 for continuous
    pub interval: f32,
    /// Skew of the normalised mapping; below 1.0 gives more travel to low values
    pub skew: f32,
}

impl ParamSpec {
    const fn frequency(
        id: ParamId,
        key: &'static str,
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
        skew: f32,
    ) -> Self {
        Self {
            id,
            key,
            name,
            min,
            max,
            default,
            unit: "Hz",
            interval: 1.0,
            skew,
        }
    }

    // Q below 0.1 makes the design formulas blow up, so the range stops there
    const fn q(id: ParamId, key: &'static str, name: &'static str) -> Self {
        Self {
            id,
            key,
            name,
            min: 0.1,
            max: 20.0,
            default: 1.0,
            unit: "Q",
            interval: 0.0,
            skew: 0.25,
        }
    }

    const fn decibels(id: ParamId, key: &'static str, name: &'static str) -> Self {
        Self {
            id,
            key,
            name,
            min: -40.0,
            max: 40.0,
            default: 0.0,
            unit: "dB",
            interval: 0.0,
            skew: 1.0,
        }
    }

    /// Snap to the interval and clamp into range. Non-finite input maps to
    /// the default so nothing unsafe ever reaches the coefficient formulas.
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default;
        }
        let snapped = if self.interval > 0.0 {
            self.min + self.interval * ((value - self.min) / self.interval).round()
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    /// Map a plain value to the host's 0..1 automation range
    pub fn to_normalized(&self, value: f32) -> f32 {
        let proportion = ((self.clamp(value) - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Map a 0..1 automation value back to a plain, legal value
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let mut proportion = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.clamp(self.min + (self.max - self.min) * proportion)
    }
}

/// Parameter layout, indexed by [`ParamId::index`]
pub static PARAMS: [ParamSpec; PARAM_COUNT] = [
    ParamSpec::frequency(ParamId::LowPassFrequency, "LPF", "Low Pass Cutoff Frequency", 20.0, 22000.0, 20000.0, 0.95),
    ParamSpec::q(ParamId::LowPassQ, "LPFQ", "Low Pass Q"),
    ParamSpec::frequency(ParamId::HighPassFrequency, "HPF", "High Pass Cutoff Frequency", 20.0, 22000.0, 20.0, 0.2),
    ParamSpec::q(ParamId::HighPassQ, "HPFQ", "High Pass Q"),
    ParamSpec::frequency(ParamId::LowMidFrequency, "LOMIDF", "Low-Mid Centre Frequency", 20.0, 300.0, 200.0, 0.8),
    ParamSpec::q(ParamId::LowMidQ, "LOMIDQ", "Low-Mid Q"),
    ParamSpec::decibels(ParamId::LowMidGain, "LOMIDGAIN", "Low-Mid Gain"),
    ParamSpec::frequency(ParamId::MidFrequency, "MIDF", "Mid Centre Frequency", 250.0, 2500.0, 800.0, 0.5),
    ParamSpec::q(ParamId::MidQ, "MIDQ", "Mid Q"),
    ParamSpec::decibels(ParamId::MidGain, "MIDGAIN", "Mid Gain"),
    ParamSpec::frequency(ParamId::HighMidFrequency, "HIMIDF", "High-Mid Centre Frequency", 2000.0, 20000.0, 4000.0, 0.5),
    ParamSpec::q(ParamId::HighMidQ, "HIMIDQ", "High-Mid Q"),
    ParamSpec::decibels(ParamId::HighMidGain, "HIMIDGAIN", "High-Mid Gain"),
    ParamSpec::decibels(ParamId::OutputGain, "OUT", "Volume"),
];

/// Immutable copy of every parameter value at one instant
///
/// Fixed-size and `Copy`: taking one on the audio thread never allocates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    values: [f32; PARAM_COUNT],
}

impl ParameterSnapshot {
    /// Snapshot holding every parameter's default
    pub fn defaults() -> Self {
        Self {
            values: core::array::from_fn(|i| PARAMS[i].default),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()]
    }

    /// Look a value up by its string key
    pub fn get_by_key(&self, key: &str) -> Option<f32> {
        key.parse::<ParamId>().ok().map(|id| self.get(id))
    }

    /// Builder-style setter. Values are stored as given; the store clamps
    /// them on [`EqParameters::load_snapshot`].
    pub fn with(mut self, id: ParamId, value: f32) -> Self {
        self.values[id.index()] = value;
        self
    }

    /// Iterate `(id, value)` pairs in layout order
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        ParamId::ALL.iter().map(move |&id| (id, self.get(id)))
    }
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Live parameter values shared between the parameter thread and the
/// audio thread
///
/// Every write that changes a value raises the dirty flag; the processor
/// consumes it at the start of the next block.
#[derive(Debug)]
pub struct EqParameters {
    values: [AtomicU32; PARAM_COUNT],
    dirty: AtomicBool,
}

impl EqParameters {
    /// Store holding the layout defaults. Starts dirty so the first block
    /// picks the values up even without an explicit change.
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| AtomicU32::new(PARAMS[i].default.to_bits())),
            dirty: AtomicBool::new(true),
        }
    }

    /// Clamp and store a value, returning what was stored
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let clamped = id.spec().clamp(value);
        let previous = self.values[id.index()].swap(clamped.to_bits(), Ordering::Relaxed);
        if previous != clamped.to_bits() {
            self.mark_dirty();
        }
        clamped
    }

    /// Set a value by its string key
    pub fn set_by_key(&self, key: &str, value: f32) -> Result<f32, CoreError> {
        let id: ParamId = key.parse()?;
        Ok(self.set(id, value))
    }

    /// Set a value from the host's 0..1 automation range
    pub fn set_normalized(&self, id: ParamId, normalized: f32) -> f32 {
        self.set(id, id.spec().from_normalized(normalized))
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Read every value into a snapshot
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            values: core::array::from_fn(|i| f32::from_bits(self.values[i].load(Ordering::Relaxed))),
        }
    }

    /// Replace every value, e.g. when a host restores saved state
    pub fn load_snapshot(&self, snapshot: &ParameterSnapshot) {
        for (id, value) in snapshot.iter() {
            self.set(id, value);
        }
    }

    pub fn reset_to_defaults(&self) {
        self.load_snapshot(&ParameterSnapshot::defaults());
    }

    /// Flag derived state as stale without changing any value
    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty flag, returning whether it was set
    #[inline]
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

impl Default for EqParameters {
    fn default() -> Self {
        Self::new()
    }
}
