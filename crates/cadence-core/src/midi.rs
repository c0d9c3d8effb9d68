//! MIDI 1.0 short-message decoding.
//!
//! Raw channel-voice and system messages are normalized into
//! [`SynthCommand`]s, the only form in which control data reaches the
//! engine. Decoding is a pure function: malformed or unsupported messages
//! produce `None` and are dropped by the caller.
//!
//! ## Normalization Rules
//!
//! - Note On with velocity 0 becomes Note Off (velocity 0)
//! - CC 123 (All Notes Off) and CC 126 (Mono Mode On) become [`SynthCommand::AllNotesOff`]
//! - System Stop (`0xFC`) and Reset (`0xFF`) become [`SynthCommand::AllNotesOff`]
//! - Pitch bend is re-centered to the signed range `-8192..=8191`

use crate::engine::Engine;

/// MIDI channel (0-15).
pub type MidiChannel = u8;

/// MIDI note number (0-127, where 60 = middle C).
pub type MidiNote = u8;

/// Status byte values.
pub mod status {
    /// Note Off (channel voice, high nibble).
    pub const NOTE_OFF: u8 = 0x80;
    /// Note On (channel voice, high nibble).
    pub const NOTE_ON: u8 = 0x90;
    /// Polyphonic Key Pressure (channel voice, high nibble).
    pub const POLY_PRESSURE: u8 = 0xA0;
    /// Control Change (channel voice, high nibble).
    pub const CONTROL_CHANGE: u8 = 0xB0;
    /// Program Change (channel voice, high nibble).
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    /// Channel Pressure (channel voice, high nibble).
    pub const CHANNEL_PRESSURE: u8 = 0xD0;
    /// Pitch Bend (channel voice, high nibble).
    pub const PITCH_BEND: u8 = 0xE0;
    /// System Real-Time: Stop (full byte).
    pub const STOP: u8 = 0xFC;
    /// System Reset (full byte).
    pub const RESET: u8 = 0xFF;
}

/// Controller numbers with special meaning to the decoder.
pub mod cc {
    /// All Notes Off (CC 123).
    pub const ALL_NOTES_OFF: u8 = 123;
    /// Mono Mode On (CC 126), which implies All Notes Off.
    pub const MONO_MODE_ON: u8 = 126;
}

/// Pitch bend center in raw 14-bit units.
pub const PITCH_BEND_CENTER: i32 = 8192;

/// A decoded control command for the synthesis engine.
///
/// All data values are 7-bit (0-127) except [`SynthCommand::PitchBend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthCommand {
    NoteOn {
        channel: MidiChannel,
        key: MidiNote,
        velocity: u8,
    },
    NoteOff {
        channel: MidiChannel,
        key: MidiNote,
        velocity: u8,
    },
    /// Signed 14-bit bend, 0 = center.
    PitchBend { channel: MidiChannel, value: i32 },
    ControlChange {
        channel: MidiChannel,
        controller: u8,
        value: u8,
    },
    ProgramChange { channel: MidiChannel, program: u8 },
    ChannelPressure { channel: MidiChannel, value: u8 },
    PolyPressure {
        channel: MidiChannel,
        key: MidiNote,
        value: u8,
    },
    AllNotesOff,
}

impl SynthCommand {
    /// Forward this command to the engine.
    #[inline]
    pub fn dispatch<E: Engine>(self, engine: &mut E) {
        match self {
            Self::NoteOn {
                channel,
                key,
                velocity,
            } => engine.play_note(channel, key, velocity),
            Self::NoteOff {
                channel,
                key,
                velocity,
            } => engine.release_note(channel, key, velocity),
            Self::PitchBend { channel, value } => engine.pitch_bend(channel, value),
            Self::ControlChange {
                channel,
                controller,
                value,
            } => engine.channel_controller(channel, controller, value),
            Self::ProgramChange { channel, program } => engine.program_change(channel, program),
            Self::ChannelPressure { channel, value } => engine.channel_aftertouch(channel, value),
            Self::PolyPressure {
                channel,
                key,
                value,
            } => engine.poly_aftertouch(channel, key, value),
            Self::AllNotesOff => engine.all_notes_off(),
        }
    }
}

/// Decode one MIDI 1.0 message.
///
/// Returns `None` for empty or truncated messages, running-status data
/// bytes, and any status the engine has no use for.
pub fn decode_midi(bytes: &[u8]) -> Option<SynthCommand> {
    let (&first, data) = bytes.split_first()?;

    // System messages carry no channel; match the whole byte.
    match first {
        status::STOP | status::RESET => return Some(SynthCommand::AllNotesOff),
        0xF0..=0xFF => return None,
        0x00..=0x7F => return None,
        _ => {}
    }

    let kind = first & 0xF0;
    let channel = first & 0x0F;
    let data1 = || data.first().map(|b| b & 0x7F);
    let data2 = || data.get(1).map(|b| b & 0x7F);

    let command = match kind {
        status::NOTE_ON | status::NOTE_OFF => {
            let key = data1()?;
            let velocity = data2()?;
            if kind == status::NOTE_OFF || velocity == 0 {
                SynthCommand::NoteOff {
                    channel,
                    key,
                    velocity,
                }
            } else {
                SynthCommand::NoteOn {
                    channel,
                    key,
                    velocity,
                }
            }
        }
        status::PITCH_BEND => {
            let lsb = data1()? as i32;
            let msb = data2()? as i32;
            SynthCommand::PitchBend {
                channel,
                value: (lsb | (msb << 7)) - PITCH_BEND_CENTER,
            }
        }
        status::CONTROL_CHANGE => {
            // Mode messages are matched on the unmasked byte.
            let raw_controller = *data.first()?;
            let controller = raw_controller & 0x7F;
            let value = data2()?;
            if raw_controller == cc::ALL_NOTES_OFF || raw_controller == cc::MONO_MODE_ON {
                SynthCommand::AllNotesOff
            } else {
                SynthCommand::ControlChange {
                    channel,
                    controller,
                    value,
                }
            }
        }
        status::PROGRAM_CHANGE => SynthCommand::ProgramChange {
            channel,
            program: data1()?,
        },
        status::CHANNEL_PRESSURE => SynthCommand::ChannelPressure {
            channel,
            value: data1()?,
        },
        status::POLY_PRESSURE => SynthCommand::PolyPressure {
            channel,
            key: data1()?,
            value: data2()?,
        },
        _ => return None,
    };

    Some(command)
}
