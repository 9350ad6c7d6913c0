//! Synthesis plane for the twinplane synthesizer.
//!
//! Holds a replica of the control plane's state, updated only by wire
//! packets, and renders one mono sample per sample period from a fixed bank
//! of generators. Everything on the render path is integer arithmetic over
//! precomputed tables.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod envelope;
pub mod frequency;
mod mixer;
mod voice;
pub mod waveform;

pub use envelope::{AdsrStage, LEVEL_MAX};
pub use frequency::{
    apply_pitch_bend, frequency_to_wavelength, note_to_frequency, FREQ_SHIFT, LIFE_SHIFT, LIFE_STEP,
};
pub use mixer::{Engine, HEADROOM_SHIFT};
pub use voice::VoiceRegisters;
pub use waveform::oscillate;
