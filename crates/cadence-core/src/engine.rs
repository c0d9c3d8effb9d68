//! The synthesis engine collaborator.
//!
//! The core never synthesizes audio itself. It drives an implementor of
//! [`Engine`], which computes audio in fixed sub-blocks of
//! [`Engine::BLOCK_SIZE`] samples and exposes per-block input/output buffers.
//!
//! ```text
//! host buffers ──► Processor ──► Engine::process_block()
//!                     │              │
//!                     │              └─ input_mut(ch)[p] / output(ch)[p]
//!                     └─ commands, parameter writes, TimeInfo
//! ```
//!
//! All methods are called from the audio thread except
//! [`Engine::set_sample_rate`], which is called once during setup.

use crate::types::{ExternalParamIndex, InternalParamId};

/// Musical time shared between the core and the engine.
///
/// The core writes the effective tempo once per cycle and advances
/// `beat_position` at every sub-block boundary. When the host reports a
/// playing transport with a valid position, the core overwrites the
/// position with the host's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInfo {
    /// Tempo in beats per minute.
    pub tempo: f64,
    /// Position in quarter notes.
    pub beat_position: f64,
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            tempo: crate::types::DEFAULT_TEMPO,
            beat_position: 0.0,
        }
    }
}

/// A block-based synthesizer driven by the processing core.
///
/// # Buffer Contract
///
/// `input_mut` and `output` return slices of exactly `BLOCK_SIZE` samples for
/// every channel below `NUM_INPUTS` / `NUM_OUTPUTS`. Sample `p` of the output
/// buffers is read after the core has written sample `p` of the input
/// buffers, so an engine may consume the input of the block that was just
/// filled when it computes the next one.
///
/// # Real-Time Safety
///
/// Every method except `set_sample_rate` runs on the audio thread and must
/// not allocate, lock or block.
pub trait Engine: Send + 'static {
    /// Internal processing granularity in samples.
    const BLOCK_SIZE: usize;

    /// Number of audio input channels.
    const NUM_INPUTS: usize;

    /// Number of audio output channels.
    const NUM_OUTPUTS: usize;

    /// Number of continuous parameters exposed as host control ports.
    const NUM_PARAMS: usize;

    /// Configure the engine for a new sample rate.
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Map a host-visible parameter index to the engine's own identifier.
    ///
    /// Must be a pure function of `external`.
    fn remap_external_to_internal(external: ExternalParamIndex) -> InternalParamId;

    /// Current normalized (0.0 to 1.0) value of a parameter.
    fn parameter(&self, id: InternalParamId) -> f32;

    /// Set a normalized (0.0 to 1.0) parameter value.
    fn set_parameter(&mut self, id: InternalParamId, value: f32);

    fn play_note(&mut self, channel: u8, key: u8, velocity: u8);

    fn release_note(&mut self, channel: u8, key: u8, velocity: u8);

    /// Pitch bend, centered at 0 (range -8192..=8191).
    fn pitch_bend(&mut self, channel: u8, value: i32);

    fn channel_controller(&mut self, channel: u8, controller: u8, value: u8);

    fn program_change(&mut self, channel: u8, program: u8);

    fn channel_aftertouch(&mut self, channel: u8, value: u8);

    fn poly_aftertouch(&mut self, channel: u8, key: u8, value: u8);

    /// Silence every sounding voice.
    fn all_notes_off(&mut self);

    /// Compute the next `BLOCK_SIZE` samples into the output buffers.
    fn process_block(&mut self);

    /// Per-block input buffer for `channel`.
    fn input_mut(&mut self, channel: usize) -> &mut [f32];

    /// Per-block output buffer for `channel`.
    fn output(&self, channel: usize) -> &[f32];

    fn time_info(&self) -> &TimeInfo;

    fn time_info_mut(&mut self) -> &mut TimeInfo;

    /// Toggle the engine between running and idle.
    fn set_active(&mut self, active: bool);

    /// Whether host audio input should be copied into the engine.
    ///
    /// Instruments typically ignore their inputs, so this defaults to `false`.
    fn accepts_input(&self) -> bool {
        false
    }
}
