//! Shared state records for the twinplane synthesizer.
//!
//! Both planes speak in terms of these types: the control plane owns the
//! authoritative copies and the synthesis plane holds replicas that are only
//! ever updated from wire packets.
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod envelope;
mod instrument;
mod limits;
mod state;

pub use envelope::Envelope;
pub use instrument::Instrument;
pub use limits::{
    ms_to_samples, ChannelIndex, NoteIndex, Sample, Velocity, WideSample, DRUM_CHANNEL,
    N_GENERATORS, N_MIDI_CHANNELS, N_MIDI_KEYS, REFERENCE_FREQ_HZ, REFERENCE_NOTE, SAMPLE_MAX,
    SAMPLE_RATE, VELOCITY_MAX,
};
pub use state::{GlobalState, VoiceAssignment};
