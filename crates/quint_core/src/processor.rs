//! Block Processor
//!
//! Owns every piece of mutable DSP state (5 bands × 2 channels of filter
//! stages, one gain smoother per channel) and runs the per-block pipeline:
//!
//! ```text
//! dirty? ──▶ update coefficients ──▶ zero unused outputs
//!                                          │
//!   per channel, per sample:               ▼
//!   LPF ─▶ HPF ─▶ low-mid ─▶ mid ─▶ high-mid ─▶ × gain ─▶ meter ─▶ clip
//! ```
//!
//! # Real-time Safety
//!
//! `process_block` performs no allocation, locking, logging or syscalls.
//! All storage is fixed-size and owned by the processor from construction.

use std::sync::Arc;

use tracing::{debug, info, warn};

use quint_dsp::{hard_clip, FilterCoefficients, FilterStage, GainSmoother, LevelMeter, MeterReading};

use crate::config::{ProcessSpec, BAND_COUNT, MAX_CHANNELS, OUTPUT_GAIN_RAMP_SECONDS};
use crate::error::CoreResult;
use crate::params::EqParameters;
use crate::update::{Band, EqDesign};

/// Interface a plugin host drives the processor through
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no logging, no mutex locks)
/// - Constant or O(n) time complexity where n = block size
pub trait AudioProcessor: Send {
    /// Allocate and reset for a new stream. On error the processor stays inactive.
    fn prepare_to_play(&mut self, spec: ProcessSpec) -> CoreResult<()>;

    /// Stop processing; storage stays allocated for the next prepare
    fn release_resources(&mut self);

    /// Process planar audio in place
    fn process(&mut self, buffer: &mut [&mut [f32]], num_input_channels: usize, num_samples: usize);

    /// Reset internal state (delay lines, ramps, meters)
    fn reset(&mut self);

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;

    /// How long output keeps ringing after input stops
    fn tail_length_seconds(&self) -> f64 {
        0.0
    }
}

/// Whether blocks are processed at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// Initial state, and after release or a rejected prepare
    Inactive,
    /// Between a successful prepare and the next release
    Active,
}

/// Filter cascade and output gain for one channel
struct ChannelStrip {
    filters: [FilterStage; BAND_COUNT],
    gain: GainSmoother,
}

impl ChannelStrip {
    fn new() -> Self {
        Self {
            filters: core::array::from_fn(|_| FilterStage::passthrough()),
            gain: GainSmoother::new(0.0),
        }
    }

    fn apply(&mut self, design: &EqDesign) {
        for (filter, coefficients) in self.filters.iter_mut().zip(design.bands.iter()) {
            filter.set_coefficients(*coefficients);
        }
        self.gain.set_target(design.output_gain);
    }

    fn reset(&mut self, sample_rate: f32) {
        for filter in self.filters.iter_mut() {
            filter.reset();
        }
        self.gain.reset(sample_rate, OUTPUT_GAIN_RAMP_SECONDS);
    }

    /// Filters in band order, then the smoothed gain. Not clipped.
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        let mut y = sample;
        for filter in self.filters.iter_mut() {
            y = filter.process(y);
        }
        y * self.gain.next_value()
    }
}

/// The five-band equalizer's real-time core
pub struct EqProcessor {
    params: Arc<EqParameters>,
    meter: Arc<LevelMeter>,
    channels: [ChannelStrip; MAX_CHANNELS],
    spec: ProcessSpec,
    state: ActivationState,
}

impl EqProcessor {
    /// Create an inactive processor reading from `params`
    pub fn new(params: Arc<EqParameters>) -> Self {
        Self {
            params,
            meter: Arc::new(LevelMeter::new()),
            channels: core::array::from_fn(|_| ChannelStrip::new()),
            spec: ProcessSpec::default(),
            state: ActivationState::Inactive,
        }
    }

    /// Prepare for a stereo stream
    pub fn prepare(&mut self, sample_rate: f32, block_size_hint: u32) -> CoreResult<()> {
        self.prepare_with(ProcessSpec::stereo(sample_rate, block_size_hint))
    }

    /// Validate `spec`, design coefficients from the current parameters and
    /// reset filters, gain ramps and meters. A rejected spec leaves the
    /// processor inactive.
    pub fn prepare_with(&mut self, spec: ProcessSpec) -> CoreResult<()> {
        if let Err(err) = spec.validate() {
            warn!("Rejected prepare: {}", err);
            self.state = ActivationState::Inactive;
            return Err(err);
        }

        self.params.take_dirty();
        let snapshot = self.params.snapshot();
        let design = match EqDesign::from_snapshot(&snapshot, spec.sample_rate) {
            Ok(design) => design,
            Err(err) => {
                warn!("Rejected prepare, coefficient design failed: {}", err);
                self.state = ActivationState::Inactive;
                return Err(err.into());
            }
        };

        for (band, coefficients) in Band::ALL.iter().zip(design.bands.iter()) {
            debug!("{:?} coefficients: {:?}", band, coefficients);
        }

        self.spec = spec;
        for strip in self.channels.iter_mut() {
            strip.apply(&design);
            // Snaps the gain straight to the new target
            strip.reset(spec.sample_rate);
        }
        self.meter.reset();
        self.state = ActivationState::Active;

        info!(
            "Prepared: {} Hz, {} channel(s), block hint {} ({:.2} ms)",
            spec.sample_rate,
            spec.channels,
            spec.block_size,
            spec.latency_ms()
        );
        Ok(())
    }

    /// Stop processing. Filter storage stays allocated for the next prepare.
    pub fn release(&mut self) {
        if self.state == ActivationState::Active {
            info!("Released");
        }
        self.state = ActivationState::Inactive;
    }

    /// Process one block of planar audio in place
    ///
    /// `buffer` holds one slice per output channel. The first
    /// `min(num_input_channels, prepared channels)` channels are filtered;
    /// the rest are filled with silence. Does nothing while inactive.
    ///
    /// # Real-time Safety
    /// No allocations, no locks. O(channels × samples).
    pub fn process_block(
        &mut self,
        buffer: &mut [&mut [f32]],
        num_input_channels: usize,
        num_samples: usize,
    ) {
        if self.state != ActivationState::Active {
            return;
        }

        if self.params.take_dirty() {
            self.update();
        }

        let processed = num_input_channels
            .min(self.spec.channels as usize)
            .min(buffer.len());

        for channel in buffer.iter_mut().skip(processed) {
            let len = num_samples.min(channel.len());
            channel[..len].fill(0.0);
        }

        for (strip, channel) in self.channels.iter_mut().zip(buffer.iter_mut()).take(processed) {
            let len = num_samples.min(channel.len());
            for sample in channel[..len].iter_mut() {
                let y = strip.process_sample(*sample);
                self.meter.observe(y);
                *sample = hard_clip(y);
            }
            self.meter.finish_channel();
        }

        self.meter.finish_block(processed);
    }

    /// Coefficient update on the audio thread. The dirty flag has already
    /// been consumed, so a change landing now triggers another update next
    /// block. A failed design keeps the previous coefficients.
    fn update(&mut self) {
        let snapshot = self.params.snapshot();
        if let Ok(design) = EqDesign::from_snapshot(&snapshot, self.spec.sample_rate) {
            for strip in self.channels.iter_mut() {
                strip.apply(&design);
            }
        }
    }

    /// Clear filter delay lines, snap gain ramps to target and zero meters
    pub fn reset(&mut self) {
        for strip in self.channels.iter_mut() {
            strip.reset(self.spec.sample_rate);
        }
        self.meter.reset();
    }

    /// Non-blocking read of both meter values
    pub fn read_meters(&self) -> MeterReading {
        self.meter.read()
    }

    pub fn reset_meters(&self) {
        self.meter.reset();
    }

    /// Shared meter handle for UI threads
    pub fn meter(&self) -> Arc<LevelMeter> {
        Arc::clone(&self.meter)
    }

    /// Parameter store this processor reads from
    pub fn parameters(&self) -> &Arc<EqParameters> {
        &self.params
    }

    /// Coefficients currently loaded for `band` on `channel`
    pub fn coefficients(&self, band: Band, channel: usize) -> Option<FilterCoefficients> {
        self.channels
            .get(channel)
            .map(|strip| strip.filters[band.index()].coefficients())
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ActivationState::Active
    }

    /// Spec from the last successful prepare
    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }
}

impl Default for EqProcessor {
    fn default() -> Self {
        Self::new(Arc::new(EqParameters::new()))
    }
}

impl AudioProcessor for EqProcessor {
    fn prepare_to_play(&mut self, spec: ProcessSpec) -> CoreResult<()> {
        self.prepare_with(spec)
    }

    fn release_resources(&mut self) {
        self.release();
    }

    fn process(&mut self, buffer: &mut [&mut [f32]], num_input_channels: usize, num_samples: usize) {
        self.process_block(buffer, num_input_channels, num_samples);
    }

    fn reset(&mut self) {
        EqProcessor::reset(self);
    }

    fn name(&self) -> &'static str {
        "Quint EQ"
    }
}
