//! Packet framing: tag byte, header fields, record.

use tp_ir::{GlobalState, VoiceAssignment};

use crate::reader::{WireReader, WireWriter};
use crate::records::{
    decode_global_state, decode_voice_assignment, encode_global_state, encode_voice_assignment,
};
use crate::{
    WireError, GENERATOR_PACKET_LEN, GLOBAL_PACKET_LEN, MAX_PACKET_LEN, TAG_GENERATOR, TAG_GLOBAL,
};

/// An encoded packet. Fixed capacity, so encoding never allocates.
pub type PacketBuf = heapless::Vec<u8, MAX_PACKET_LEN>;

/// New contents for one generator slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorUpdate {
    pub slot: u16,
    /// Zero the slot's elapsed life and phase accumulator on receipt.
    pub reset: bool,
    pub assignment: VoiceAssignment,
}

/// A decoded control-link packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packet {
    /// Tag 1: replace the whole global state.
    Global(GlobalState),
    /// Tag 2: replace one generator's assignment.
    Generator(GeneratorUpdate),
}

impl Packet {
    /// Build a global-state packet.
    pub fn global(state: &GlobalState) -> PacketBuf {
        let mut buf = PacketBuf::new();
        WireWriter::new(&mut buf).write_u8(TAG_GLOBAL);
        encode_global_state(state, &mut buf);
        buf
    }

    /// Build a generator-state packet.
    pub fn generator(slot: u16, reset: bool, assignment: &VoiceAssignment) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let mut w = WireWriter::new(&mut buf);
        w.write_u8(TAG_GENERATOR);
        w.write_u16_le(slot);
        w.write_bool(reset);
        encode_voice_assignment(assignment, &mut buf);
        buf
    }

    /// Serialize this packet.
    pub fn encode(&self) -> PacketBuf {
        match self {
            Packet::Global(state) => Packet::global(state),
            Packet::Generator(update) => {
                Packet::generator(update.slot, update.reset, &update.assignment)
            }
        }
    }

    /// Parse a received packet.
    ///
    /// The length is checked against the tag's full size before any field is
    /// read. Trailing bytes beyond that size are ignored.
    pub fn decode(data: &[u8]) -> Result<Packet, WireError> {
        let (&tag, body) = data.split_first().ok_or(WireError::Empty)?;
        let expected = match tag {
            TAG_GLOBAL => GLOBAL_PACKET_LEN,
            TAG_GENERATOR => GENERATOR_PACKET_LEN,
            _ => return Err(WireError::UnknownTag(tag)),
        };
        if data.len() < expected {
            return Err(WireError::Truncated {
                tag,
                expected,
                actual: data.len(),
            });
        }

        match tag {
            TAG_GLOBAL => decode_global_state(body).map(Packet::Global),
            _ => {
                let mut r = WireReader::new(&body[..3]);
                let slot = r.read_u16_le();
                let reset = r.read_bool();
                let assignment = decode_voice_assignment(&body[3..])?;
                Ok(Packet::Generator(GeneratorUpdate {
                    slot,
                    reset,
                    assignment,
                }))
            }
        }
    }
}
