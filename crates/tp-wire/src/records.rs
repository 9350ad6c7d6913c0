//! Record layouts shared by both packet kinds.

use tp_ir::{Envelope, GlobalState, Instrument, VoiceAssignment, N_MIDI_CHANNELS};

use crate::packet::PacketBuf;
use crate::reader::{WireReader, WireWriter};
use crate::{WireError, GLOBAL_STATE_LEN, TAG_GENERATOR, TAG_GLOBAL, VOICE_ASSIGNMENT_LEN};

/// Append a `GlobalState` record (`GLOBAL_STATE_LEN` bytes).
pub fn encode_global_state(state: &GlobalState, out: &mut PacketBuf) {
    let mut w = WireWriter::new(out);
    w.write_u8(state.master_volume);
    w.write_u16_le(state.envelope.attack);
    w.write_u16_le(state.envelope.decay);
    w.write_u8(state.envelope.sustain);
    w.write_u16_le(state.envelope.release);
    for bend in state.pitch_bends {
        w.write_i8(bend);
    }
}

/// Decode a `GlobalState` record from the start of `data`.
pub fn decode_global_state(data: &[u8]) -> Result<GlobalState, WireError> {
    if data.len() < GLOBAL_STATE_LEN {
        return Err(WireError::Truncated {
            tag: TAG_GLOBAL,
            expected: GLOBAL_STATE_LEN,
            actual: data.len(),
        });
    }
    let mut r = WireReader::new(&data[..GLOBAL_STATE_LEN]);
    let master_volume = r.read_u8();
    let envelope = Envelope {
        attack: r.read_u16_le(),
        decay: r.read_u16_le(),
        sustain: r.read_u8(),
        release: r.read_u16_le(),
    };
    let mut pitch_bends = [0i8; N_MIDI_CHANNELS];
    for bend in &mut pitch_bends {
        *bend = r.read_i8();
    }
    Ok(GlobalState {
        master_volume,
        envelope,
        pitch_bends,
    })
}

/// Append a `VoiceAssignment` record (`VOICE_ASSIGNMENT_LEN` bytes).
pub fn encode_voice_assignment(assignment: &VoiceAssignment, out: &mut PacketBuf) {
    let mut w = WireWriter::new(out);
    w.write_bool(assignment.enabled);
    w.write_u32_le(assignment.instrument.code());
    w.write_u8(assignment.note);
    w.write_u8(assignment.channel);
    w.write_u8(assignment.velocity);
}

/// Decode a `VoiceAssignment` record from the start of `data`.
pub fn decode_voice_assignment(data: &[u8]) -> Result<VoiceAssignment, WireError> {
    if data.len() < VOICE_ASSIGNMENT_LEN {
        return Err(WireError::Truncated {
            tag: TAG_GENERATOR,
            expected: VOICE_ASSIGNMENT_LEN,
            actual: data.len(),
        });
    }
    let mut r = WireReader::new(&data[..VOICE_ASSIGNMENT_LEN]);
    let enabled = r.read_bool();
    let code = r.read_u32_le();
    let instrument = Instrument::from_code(code).ok_or(WireError::UnknownInstrument(code))?;
    Ok(VoiceAssignment {
        enabled,
        instrument,
        note: r.read_u8(),
        channel: r.read_u8(),
        velocity: r.read_u8(),
    })
}
