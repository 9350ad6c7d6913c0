//! ADSR envelope settings.

use crate::limits::ms_to_samples;

/// Attack/decay/sustain/release settings shared by every generator.
///
/// Durations are counts of sample periods. `sustain` is a fraction of full
/// scale, from 0 to 0xFF.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Envelope {
    pub attack: u16,
    pub decay: u16,
    pub sustain: u8,
    pub release: u16,
}

impl Default for Envelope {
    /// Organ-style gate: no ramps, sustain at roughly half scale.
    fn default() -> Self {
        Self {
            attack: 0,
            decay: 0,
            sustain: 0x80,
            release: 0,
        }
    }
}

impl Envelope {
    pub const fn new(attack: u16, decay: u16, sustain: u8, release: u16) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Build an envelope from durations in milliseconds.
    pub fn from_millis(attack_ms: u32, decay_ms: u32, sustain: u8, release_ms: u32) -> Self {
        Self {
            attack: ms_to_samples(attack_ms),
            decay: ms_to_samples(decay_ms),
            sustain,
            release: ms_to_samples(release_ms),
        }
    }
}
