//! Control plane for the twinplane synthesizer.
//!
//! Interprets MIDI-style messages, decides which generator slot plays each
//! note, and emits one wire packet per state change. It never renders audio
//! and never hears back from the synthesis plane.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod control;
mod midi;
mod sink;
mod voice_pool;

pub use control::ControlPlane;
pub use midi::{bend_to_wire, MidiMessage, PITCH_BEND_CENTER};
pub use sink::PacketSink;
pub use voice_pool::VoicePool;
