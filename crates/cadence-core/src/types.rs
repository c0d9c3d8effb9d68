//! Common types and limits used throughout the Cadence core.

// =============================================================================
// Audio Channel Limits
// =============================================================================
//
// Channel slices are handed to the scheduler through fixed-size stack arrays so
// that building a `Buffer` never touches the heap. Engines that declare more
// channels than this fail during setup rather than on the audio thread.
// =============================================================================

/// Maximum number of audio channels per direction (input or output).
///
/// 32 is also the largest array length for which the standard library
/// implements `Default`, which keeps buffer construction allocation-free.
pub const MAX_CHANNELS: usize = 32;

/// Tempo in BPM reported to the engine when the host never sent a valid one.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Index of a continuous parameter as seen by the host (stable port order).
pub type ExternalParamIndex = usize;

/// Index of a parameter as understood by the engine.
pub type InternalParamId = usize;

/// Frame offset of an event, relative to the start of the current cycle.
///
/// Signed because hosts are allowed to deliver slightly late events; negative
/// offsets are applied at the first sub-block boundary.
pub type FrameOffset = i64;
