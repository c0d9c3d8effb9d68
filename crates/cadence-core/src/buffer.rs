//! Host audio buffers for a single processing cycle.
//!
//! [`Buffer`] bundles the host's input and output channel slices. The host
//! granularity (`num_samples`) is unrelated to the engine's sub-block size;
//! the scheduler walks both in lockstep.
//!
//! # Real-Time Safety
//!
//! Channel slices live in fixed-size stack arrays bounded by
//! [`MAX_CHANNELS`]. No heap allocations occur during construction or use.

use crate::types::MAX_CHANNELS;

/// Input and output audio for one `process()` call.
///
/// # Lifetime
///
/// The `'a` lifetime ties the buffer to the host's audio data. Buffers are
/// only valid within a single processing cycle.
pub struct Buffer<'a> {
    /// Option<&[f32]> is Copy, so [None; N] works
    inputs: [Option<&'a [f32]>; MAX_CHANNELS],
    outputs: [Option<&'a mut [f32]>; MAX_CHANNELS],
    num_input_channels: usize,
    num_output_channels: usize,
    num_samples: usize,
}

impl<'a> Buffer<'a> {
    /// Create a buffer from channel slices.
    ///
    /// Channels beyond [`MAX_CHANNELS`] are ignored. Every slice must hold at
    /// least `num_samples` samples.
    #[inline]
    pub fn new(
        inputs: impl IntoIterator<Item = &'a [f32]>,
        outputs: impl IntoIterator<Item = &'a mut [f32]>,
        num_samples: usize,
    ) -> Self {
        Self::from_slots(
            inputs.into_iter().map(Some),
            outputs.into_iter().map(Some),
            num_samples,
        )
    }

    /// Create a buffer from channel slots that may be disconnected.
    ///
    /// A `None` slot still counts as a channel, so later channels keep their
    /// index; reads and writes to it are skipped.
    pub fn from_slots(
        inputs: impl IntoIterator<Item = Option<&'a [f32]>>,
        outputs: impl IntoIterator<Item = Option<&'a mut [f32]>>,
        num_samples: usize,
    ) -> Self {
        let mut input_arr: [Option<&'a [f32]>; MAX_CHANNELS] = [None; MAX_CHANNELS];
        let mut num_input_channels = 0;
        for (i, slot) in inputs.into_iter().take(MAX_CHANNELS).enumerate() {
            debug_assert!(slot.map_or(true, |s| s.len() >= num_samples));
            input_arr[i] = slot;
            num_input_channels = i + 1;
        }

        // Can't use [None; N] for &mut because it's not Copy
        let mut output_arr: [Option<&'a mut [f32]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_output_channels = 0;
        for (i, slot) in outputs.into_iter().take(MAX_CHANNELS).enumerate() {
            debug_assert!(slot.as_ref().map_or(true, |s| s.len() >= num_samples));
            output_arr[i] = slot;
            num_output_channels = i + 1;
        }

        Self {
            inputs: input_arr,
            outputs: output_arr,
            num_input_channels,
            num_output_channels,
            num_samples,
        }
    }

    /// Create an output-only buffer (no input forwarding possible).
    #[inline]
    pub fn outputs_only(
        outputs: impl IntoIterator<Item = &'a mut [f32]>,
        num_samples: usize,
    ) -> Self {
        Self::new(std::iter::empty(), outputs, num_samples)
    }

    /// Number of samples in this cycle.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn num_input_channels(&self) -> usize {
        self.num_input_channels
    }

    #[inline]
    pub fn num_output_channels(&self) -> usize {
        self.num_output_channels
    }

    /// Input channel slice, if connected.
    #[inline]
    pub fn input(&self, channel: usize) -> Option<&'a [f32]> {
        self.inputs.get(channel).copied().flatten()
    }

    /// Mutable output channel slice, if connected.
    #[inline]
    pub fn output_mut(&mut self, channel: usize) -> Option<&mut [f32]> {
        self.outputs.get_mut(channel).and_then(|o| o.as_deref_mut())
    }
}
