//! Timed events and the event decoder.
//!
//! The format layer turns each host event into a [`TimedEvent`] whose
//! payload is already classified (MIDI bytes, a transport position object,
//! or something the core does not understand). [`TimedEvent::decode`] then
//! produces the normalized [`Decoded`] form the scheduler applies.

use crate::midi::{decode_midi, SynthCommand};
use crate::transport::TransportUpdate;
use crate::types::FrameOffset;

/// A numeric field as it appeared on the wire.
///
/// Hosts may encode transport values with any of these representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
}

impl NumericValue {
    /// Widen to `f64`.
    #[inline]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Double(v) => v,
            Self::Float(v) => v as f64,
            Self::Int(v) => v as f64,
            Self::Long(v) => v as f64,
        }
    }
}

impl From<NumericValue> for f64 {
    fn from(value: NumericValue) -> Self {
        value.to_f64()
    }
}

/// Fields extracted from a transport position object.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionPayload {
    pub speed: Option<NumericValue>,
    pub tempo: Option<NumericValue>,
    pub beat: Option<NumericValue>,
}

/// Classified event body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventPayload<'a> {
    /// Raw MIDI 1.0 message bytes.
    Midi(&'a [u8]),
    /// Transport position snapshot.
    Position(PositionPayload),
    /// Anything else the host sent; ignored.
    Unknown,
}

/// An event scheduled at a frame offset within the current cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent<'a> {
    pub frame: FrameOffset,
    pub payload: EventPayload<'a>,
}

impl<'a> TimedEvent<'a> {
    #[inline]
    pub const fn new(frame: FrameOffset, payload: EventPayload<'a>) -> Self {
        Self { frame, payload }
    }

    /// MIDI event helper.
    #[inline]
    pub const fn midi(frame: FrameOffset, bytes: &'a [u8]) -> Self {
        Self::new(frame, EventPayload::Midi(bytes))
    }

    /// Transport position helper.
    #[inline]
    pub const fn position(frame: FrameOffset, position: PositionPayload) -> Self {
        Self::new(frame, EventPayload::Position(position))
    }

    /// Returns true if this event occurs before sample `limit`.
    #[inline]
    pub fn is_before(&self, limit: usize) -> bool {
        self.frame < limit as FrameOffset
    }

    /// Decode the payload. `None` means "ignore this event".
    #[inline]
    pub fn decode(&self) -> Option<Decoded> {
        decode_payload(&self.payload)
    }
}

/// Normalized result of decoding one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// A command for the engine.
    Command(SynthCommand),
    /// A change to the host transport.
    Transport(TransportUpdate),
}

/// Decode a classified payload.
pub fn decode_payload(payload: &EventPayload<'_>) -> Option<Decoded> {
    match payload {
        EventPayload::Midi(bytes) => decode_midi(bytes).map(Decoded::Command),
        EventPayload::Position(position) => Some(Decoded::Transport(TransportUpdate {
            speed: position.speed.map(NumericValue::to_f64),
            tempo: position.tempo.map(NumericValue::to_f64),
            beat: position.beat.map(NumericValue::to_f64),
        })),
        EventPayload::Unknown => None,
    }
}
