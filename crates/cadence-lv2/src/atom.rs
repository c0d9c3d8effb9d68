//! Atom sequence parsing.
//!
//! The host delivers events as an `atom:Sequence`: a header followed by
//! events, each a 64-bit frame time, an atom header and a body padded to
//! 8 bytes. Transport arrives as an `atom:Object` of `time:Position`, whose
//! properties are laid out the same way.
//!
//! All parsing works on byte slices bounded by the sizes the host declared,
//! so a malformed event ends iteration instead of reading past the buffer.
//! Only [`SequenceIter::from_raw`] touches raw memory.

use std::slice;

use cadence_core::{EventPayload, NumericValue, PositionPayload, TimedEvent};

use crate::sys::{
    atom_pad, Lv2AtomSequence, ATOM_EVENT_HEADER_SIZE, ATOM_HEADER_SIZE, LV2_URID,
    OBJECT_BODY_SIZE, PROPERTY_HEADER_SIZE, SEQUENCE_BODY_SIZE,
};
use crate::urid::Urids;

// =============================================================================
// Byte readers
// =============================================================================

#[inline]
fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes.get(offset..offset.checked_add(N)?)?.try_into().ok()
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    read_array(bytes, offset).map(u32::from_ne_bytes)
}

#[inline]
fn read_i64(bytes: &[u8], offset: usize) -> Option<i64> {
    read_array(bytes, offset).map(i64::from_ne_bytes)
}

/// Split one padded atom off the front of `bytes`.
///
/// `header` is the size of the fixed part preceding the body; the body size
/// is read from `size_offset`. Returns the header bytes, the body and the
/// rest of the buffer.
#[inline]
fn split_padded(bytes: &[u8], header: usize, size_offset: usize) -> Option<(&[u8], &[u8], &[u8])> {
    let size = read_u32(bytes, size_offset)? as usize;
    let end = header.checked_add(size)?;
    let body = bytes.get(header..end)?;
    let next = atom_pad(end).min(bytes.len());
    Some((&bytes[..header], body, &bytes[next..]))
}

// =============================================================================
// Sequence
// =============================================================================

/// A generic atom: type and body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomRef<'a> {
    pub type_: LV2_URID,
    pub body: &'a [u8],
}

/// One sequence event before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent<'a> {
    /// Frame offset (sequences in audio-rate units).
    pub frames: i64,
    pub atom: AtomRef<'a>,
}

/// Iterator over the events of an `atom:Sequence`.
#[derive(Debug, Clone)]
pub struct SequenceIter<'a> {
    remaining: &'a [u8],
}

impl<'a> SequenceIter<'a> {
    /// Iterate a sequence body (everything after the sequence's atom header).
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            remaining: body.get(SEQUENCE_BODY_SIZE..).unwrap_or(&[]),
        }
    }

    /// An iterator that yields nothing.
    pub fn empty() -> Self {
        Self { remaining: &[] }
    }

    /// Iterate a sequence in host memory.
    ///
    /// # Safety
    ///
    /// `sequence` must be null or point to a sequence atom whose declared
    /// size is readable, and that memory must stay unchanged for `'a`.
    pub unsafe fn from_raw(sequence: *const Lv2AtomSequence) -> Self {
        if sequence.is_null() {
            return Self::empty();
        }
        // SAFETY: caller guarantees a readable atom header.
        let size = unsafe { (*sequence).atom.size } as usize;
        // SAFETY: caller guarantees `size` bytes follow the atom header.
        let body = unsafe {
            slice::from_raw_parts((sequence as *const u8).add(ATOM_HEADER_SIZE), size)
        };
        Self::new(body)
    }
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = RawEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.remaining;
        let parsed = split_padded(bytes, ATOM_EVENT_HEADER_SIZE, 8).and_then(|(header, body, rest)| {
            let frames = read_i64(header, 0)?;
            let type_ = read_u32(header, 12)?;
            Some((RawEvent { frames, atom: AtomRef { type_, body } }, rest))
        });

        match parsed {
            Some((event, rest)) => {
                self.remaining = rest;
                Some(event)
            }
            None => {
                self.remaining = &[];
                None
            }
        }
    }
}

// =============================================================================
// Object
// =============================================================================

/// Body of an `atom:Object` (or `atom:Blank`).
#[derive(Debug, Clone, Copy)]
pub struct AtomObject<'a> {
    pub otype: LV2_URID,
    properties: &'a [u8],
}

impl<'a> AtomObject<'a> {
    /// Parse an object body; `None` if it is too short for the header.
    pub fn parse(body: &'a [u8]) -> Option<Self> {
        let otype = read_u32(body, 4)?;
        Some(Self {
            otype,
            properties: &body[OBJECT_BODY_SIZE..],
        })
    }

    /// Iterate `(key, value)` pairs in order.
    pub fn properties(&self) -> impl Iterator<Item = (LV2_URID, AtomRef<'a>)> {
        let mut remaining = self.properties;
        std::iter::from_fn(move || {
            let (header, body, rest) = split_padded(remaining, PROPERTY_HEADER_SIZE, 8)?;
            remaining = rest;
            let key = read_u32(header, 0)?;
            let type_ = read_u32(header, 12)?;
            Some((key, AtomRef { type_, body }))
        })
    }

    /// First value stored under `key`.
    pub fn get(&self, key: LV2_URID) -> Option<AtomRef<'a>> {
        self.properties().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Read a numeric atom; `None` for other types or short bodies.
pub fn numeric(atom: AtomRef<'_>, urids: &Urids) -> Option<NumericValue> {
    let t = atom.type_;
    if t == urids.atom_double {
        read_array(atom.body, 0).map(|b| NumericValue::Double(f64::from_ne_bytes(b)))
    } else if t == urids.atom_float {
        read_array(atom.body, 0).map(|b| NumericValue::Float(f32::from_ne_bytes(b)))
    } else if t == urids.atom_int {
        read_array(atom.body, 0).map(|b| NumericValue::Int(i32::from_ne_bytes(b)))
    } else if t == urids.atom_long {
        read_array(atom.body, 0).map(|b| NumericValue::Long(i64::from_ne_bytes(b)))
    } else {
        None
    }
}

/// Extract the transport fields of a `time:Position` object.
pub fn position(object: &AtomObject<'_>, urids: &Urids) -> PositionPayload {
    let field = |key| object.get(key).and_then(|atom| numeric(atom, urids));
    PositionPayload {
        speed: field(urids.time_speed),
        tempo: field(urids.time_beats_per_minute),
        beat: field(urids.time_beat),
    }
}

/// Classify one atom for the processing core.
pub fn classify<'a>(atom: AtomRef<'a>, urids: &Urids) -> EventPayload<'a> {
    if atom.type_ == urids.midi_event {
        return EventPayload::Midi(atom.body);
    }

    if urids.is_object(atom.type_) {
        if let Some(object) = AtomObject::parse(atom.body) {
            if object.otype == urids.time_position {
                return EventPayload::Position(position(&object, urids));
            }
        }
    }

    EventPayload::Unknown
}

/// Convert a raw sequence event into a core event.
#[inline]
pub fn to_timed_event<'a>(event: RawEvent<'a>, urids: &Urids) -> TimedEvent<'a> {
    TimedEvent::new(event.frames, classify(event.atom, urids))
}
