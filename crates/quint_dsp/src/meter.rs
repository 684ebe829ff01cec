//! Lock-free Peak Meter
//!
//! The audio thread folds every sample into the meter; any other thread can
//! read the published values at any time. All state is atomic f32 storage
//! (`AtomicU32` holding the bit pattern), so neither side ever blocks.
//!
//! Two readings are published:
//! - `block_average_max`: mean of each channel's peak over the last block
//! - `running_global_max`: largest peak since the last reset (session hold)

use std::sync::atomic::{AtomicU32, Ordering};

/// Snapshot of the published meter values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterReading {
    pub block_average_max: f32,
    pub running_global_max: f32,
}

/// Peak meter shared between the audio thread and observers
#[derive(Debug, Default)]
pub struct LevelMeter {
    block_average_bits: AtomicU32,
    global_max_bits: AtomicU32,
    /// Peak of the channel currently being processed
    channel_peak_bits: AtomicU32,
    /// Sum of finished channel peaks in the current block
    block_sum_bits: AtomicU32,
}

/// Raise `slot` to `value` if it is larger.
///
/// For non-negative floats the IEEE-754 bit patterns order the same way as
/// the values, so an integer max on the bits is a float max.
#[inline]
fn fetch_max_f32(slot: &AtomicU32, value: f32) {
    slot.fetch_max(value.to_bits(), Ordering::Relaxed);
}

#[inline]
fn load_f32(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Relaxed))
}

#[inline]
fn store_f32(slot: &AtomicU32, value: f32) {
    slot.store(value.to_bits(), Ordering::Relaxed);
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the channel peak and the global peak
    ///
    /// # Real-time Safety
    /// Lock-free atomic read-modify-write, no allocation.
    #[inline]
    pub fn observe(&self, sample: f32) {
        let level = sample.abs();
        if !level.is_finite() {
            return;
        }
        fetch_max_f32(&self.channel_peak_bits, level);
        fetch_max_f32(&self.global_max_bits, level);
    }

    /// Close the current channel: add its peak to the block sum
    #[inline]
    pub fn finish_channel(&self) {
        let peak = f32::from_bits(self.channel_peak_bits.swap(0, Ordering::Relaxed));
        // Only the audio thread writes the sum, a plain load/store is enough
        store_f32(&self.block_sum_bits, load_f32(&self.block_sum_bits) + peak);
    }

    /// Publish the average channel peak of the block and start a new one
    #[inline]
    pub fn finish_block(&self, channel_count: usize) {
        // Fold in a channel that was observed but never finished
        self.finish_channel();

        let sum = f32::from_bits(self.block_sum_bits.swap(0, Ordering::Relaxed));
        let average = if channel_count > 0 {
            sum / channel_count as f32
        } else {
            0.0
        };
        store_f32(&self.block_average_bits, average);
    }

    pub fn block_average_max(&self) -> f32 {
        load_f32(&self.block_average_bits)
    }

    pub fn running_global_max(&self) -> f32 {
        load_f32(&self.global_max_bits)
    }

    /// Read both published values (non-blocking)
    pub fn read(&self) -> MeterReading {
        MeterReading {
            block_average_max: self.block_average_max(),
            running_global_max: self.running_global_max(),
        }
    }

    /// Zero every quantity
    pub fn reset(&self) {
        store_f32(&self.block_average_bits, 0.0);
        store_f32(&self.global_max_bits, 0.0);
        store_f32(&self.channel_peak_bits, 0.0);
        store_f32(&self.block_sum_bits, 0.0);
    }
}
