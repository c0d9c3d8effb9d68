//! # cadence-core
//!
//! Format-agnostic processing core for block-based synthesizers.
//!
//! A synthesis engine renders audio in fixed sub-blocks, but plugin hosts
//! call in with buffers of any size and deliver events at arbitrary sample
//! offsets. This crate bridges the two: it decodes host events, tracks the
//! host transport, diffs continuous parameters, and interleaves event
//! application with sub-block computation so every event lands on the
//! correct block boundary.
//!
//! It has no knowledge of any plugin format. Format adapters (such as
//! `cadence-lv2`) translate their host's buffers and events into a
//! [`Buffer`] and a sequence of [`TimedEvent`]s and hand them to a
//! [`Processor`].
//!
//! ## Main Types
//!
//! - [`Engine`] - Trait implemented by the synthesizer
//! - [`Processor`] - Drives an engine from host processing cycles
//! - [`BlockScheduler`] - Sub-block phase tracking and event interleaving
//! - [`ParameterCache`] - Change detection for continuous parameters
//! - [`TransportState`] - Latest host transport values
//! - [`TimedEvent`] / [`SynthCommand`] - Events and their decoded form
//! - [`FpuGuard`] - Denormal-free floating-point environment for a cycle
//! - [`ProcessorError`] - Setup errors

pub mod buffer;
pub mod engine;
pub mod error;
pub mod event;
pub mod fpu;
pub mod midi;
pub mod params;
pub mod processor;
pub mod scheduler;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use buffer::Buffer;
pub use engine::{Engine, TimeInfo};
pub use error::{ProcessorError, ProcessorResult};
pub use event::{decode_payload, Decoded, EventPayload, NumericValue, PositionPayload, TimedEvent};
pub use fpu::FpuGuard;
pub use midi::{cc, decode_midi, status, MidiChannel, MidiNote, SynthCommand, PITCH_BEND_CENTER};
pub use params::ParameterCache;
pub use processor::{LifecycleState, Processor};
pub use scheduler::BlockScheduler;
pub use transport::{beats_for_frames, TransportState, TransportUpdate};
pub use types::{ExternalParamIndex, FrameOffset, InternalParamId, DEFAULT_TEMPO, MAX_CHANNELS};
