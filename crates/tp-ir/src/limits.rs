//! Constants shared by both planes.
//!
//! Changing `N_GENERATORS` rescales everything else: the voice pool, the
//! engine's register file and the valid slot range on the wire.

/// Output sample rate of the synthesis plane, in Hz.
pub const SAMPLE_RATE: u32 = 44100;

/// Number of oscillator channels (simultaneous notes).
pub const N_GENERATORS: usize = 16;

pub const N_MIDI_KEYS: usize = 128;

pub const N_MIDI_CHANNELS: usize = 16;

/// General MIDI percussion channel (zero-based). Events on it are ignored.
pub const DRUM_CHANNEL: u8 = 9;

/// MIDI note index tuned to `REFERENCE_FREQ_HZ`.
pub const REFERENCE_NOTE: u8 = 58;

pub const REFERENCE_FREQ_HZ: f64 = 440.0;

/// Largest MIDI velocity (7 bits).
pub const VELOCITY_MAX: u8 = 0x7F;

/// Largest magnitude a single generator may output.
pub const SAMPLE_MAX: Sample = 0x7FFF;

pub type NoteIndex = u8;
pub type ChannelIndex = u8;
/// Goes from 0 to `VELOCITY_MAX`.
pub type Velocity = u8;
/// Output of a single generator.
pub type Sample = i16;
/// Mixer output; wide enough to sum every generator without overflow.
pub type WideSample = i32;

/// Convert milliseconds to sample periods, saturating at `u16::MAX`.
pub fn ms_to_samples(ms: u32) -> u16 {
    let samples = ms as u64 * SAMPLE_RATE as u64 / 1000;
    samples.min(u16::MAX as u64) as u16
}
