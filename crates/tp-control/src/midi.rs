//! Channel-message parsing.
//!
//! Only the three message types that change synth state are decoded; every
//! other well-formed status is reported as [`MidiMessage::Other`] so the
//! caller can ignore it explicitly.

use tp_ir::{ChannelIndex, NoteIndex, Velocity};

/// Raw 14-bit pitch-bend value meaning "no bend".
pub const PITCH_BEND_CENTER: u16 = 0x2000;

const STATUS_NOTE_OFF: u8 = 0x8;
const STATUS_NOTE_ON: u8 = 0x9;
const STATUS_PITCH_BEND: u8 = 0xE;

/// Decoded MIDI message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOff {
        channel: ChannelIndex,
        note: NoteIndex,
        velocity: Velocity,
    },
    /// Velocity 0 is passed through as-is; the control plane treats it as a
    /// note-off.
    NoteOn {
        channel: ChannelIndex,
        note: NoteIndex,
        velocity: Velocity,
    },
    /// `value` is centered at zero, in -8192..=8191.
    PitchBend { channel: ChannelIndex, value: i16 },
    /// Any other status byte (controllers, aftertouch, system messages).
    Other { status: u8 },
}

impl MidiMessage {
    /// Parse one complete message.
    ///
    /// Returns `None` for malformed input: empty, a first byte that is not a
    /// status byte, any later byte with its high bit set, or a note or
    /// pitch-bend message that is not exactly three bytes long.
    pub fn parse(data: &[u8]) -> Option<MidiMessage> {
        let (&status, rest) = data.split_first()?;
        if status & 0x80 == 0 || rest.iter().any(|b| b & 0x80 != 0) {
            return None;
        }

        let channel = status & 0x0F;
        let kind = status >> 4;
        match kind {
            STATUS_NOTE_OFF | STATUS_NOTE_ON | STATUS_PITCH_BEND if rest.len() != 2 => None,
            STATUS_NOTE_OFF => Some(MidiMessage::NoteOff {
                channel,
                note: rest[0],
                velocity: rest[1],
            }),
            STATUS_NOTE_ON => Some(MidiMessage::NoteOn {
                channel,
                note: rest[0],
                velocity: rest[1],
            }),
            STATUS_PITCH_BEND => {
                let raw = (rest[1] as u16) << 7 | rest[0] as u16;
                Some(MidiMessage::PitchBend {
                    channel,
                    value: raw as i16 - PITCH_BEND_CENTER as i16,
                })
            }
            _ => Some(MidiMessage::Other { status }),
        }
    }

    /// Channel the message addresses, if it is a channel message.
    pub fn channel(&self) -> Option<ChannelIndex> {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => Some(channel),
            MidiMessage::Other { status } if status < 0xF0 => Some(status & 0x0F),
            MidiMessage::Other { .. } => None,
        }
    }
}

/// Scale a centered 14-bit bend to the signed byte carried on the wire.
///
/// Full scale maps to -128..=127, so +-127 is one bend range.
pub fn bend_to_wire(value: i16) -> i8 {
    (value.clamp(-8192, 8191) >> 6) as i8
}
