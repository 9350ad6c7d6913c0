//! Control-link packet codec.
//!
//! Two packet kinds travel from the control plane to the synthesis plane,
//! distinguished by a leading tag byte. All multi-byte fields are
//! little-endian and records carry no padding, so the layout is identical on
//! both devices.
//!
//! ```text
//! tag 1  global:    [1][master_volume][attack:2][decay:2][sustain][release:2][bend x16]
//! tag 2  generator: [2][slot:2][reset][enabled][instrument:4][note][channel][velocity]
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod packet;
mod reader;
mod records;

pub use packet::{GeneratorUpdate, Packet, PacketBuf};
pub use records::{
    decode_global_state, decode_voice_assignment, encode_global_state, encode_voice_assignment,
};

/// Tag byte of a global-state packet.
pub const TAG_GLOBAL: u8 = 1;
/// Tag byte of a generator-state packet.
pub const TAG_GENERATOR: u8 = 2;

/// Serialized size of a `GlobalState` record.
pub const GLOBAL_STATE_LEN: usize = 1 + 7 + tp_ir::N_MIDI_CHANNELS;
/// Serialized size of a `VoiceAssignment` record.
pub const VOICE_ASSIGNMENT_LEN: usize = 8;

/// Tag + record.
pub const GLOBAL_PACKET_LEN: usize = 1 + GLOBAL_STATE_LEN;
/// Tag + slot index + reset flag + record.
pub const GENERATOR_PACKET_LEN: usize = 1 + 2 + 1 + VOICE_ASSIGNMENT_LEN;

/// Largest packet either kind can produce.
pub const MAX_PACKET_LEN: usize = if GLOBAL_PACKET_LEN > GENERATOR_PACKET_LEN {
    GLOBAL_PACKET_LEN
} else {
    GENERATOR_PACKET_LEN
};

/// Why a packet was not applied.
///
/// Every variant is a normal steady-state outcome; receivers discard the
/// packet and keep their state unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireError {
    /// Zero-length packet.
    Empty,
    /// Tag byte is not a known packet kind.
    UnknownTag(u8),
    /// Packet is shorter than its tag requires.
    Truncated {
        tag: u8,
        expected: usize,
        actual: usize,
    },
    /// Instrument code outside the known set.
    UnknownInstrument(u32),
    /// Generator slot index beyond the receiver's generator count.
    SlotOutOfRange(u16),
}

impl core::fmt::Display for WireError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WireError::Empty => write!(f, "empty packet"),
            WireError::UnknownTag(tag) => write!(f, "unknown packet tag {}", tag),
            WireError::Truncated {
                tag,
                expected,
                actual,
            } => write!(
                f,
                "packet tag {} needs {} bytes, got {}",
                tag, expected, actual
            ),
            WireError::UnknownInstrument(code) => write!(f, "unknown instrument code {}", code),
            WireError::SlotOutOfRange(slot) => write!(f, "generator slot {} out of range", slot),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_sizes_match_layout() {
        assert_eq!(GLOBAL_STATE_LEN, 24);
        assert_eq!(GLOBAL_PACKET_LEN, 25);
        assert_eq!(GENERATOR_PACKET_LEN, 12);
        assert_eq!(MAX_PACKET_LEN, 25);
    }
}
