//! ADSR envelope evaluation.
//!
//! The envelope is stateless apart from two inputs the voice keeps for it:
//! the sample count since the voice's last reset, and the level latched on
//! the last sample the voice was held. Release always ramps down from that
//! latched level, so a note-off mid-attack does not jump.

use tp_ir::Envelope;

/// Envelope full scale.
pub const LEVEL_MAX: u32 = 0x7FFF;

/// Which segment of the envelope a voice is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdsrStage {
    Attack,
    Decay,
    Sustain,
    /// Disabled, ramping down from the latched level.
    Release,
    /// Disabled and past the release duration.
    Silent,
}

/// Sustain setting scaled to `LEVEL_MAX`.
pub fn sustain_level(envelope: &Envelope) -> u32 {
    envelope.sustain as u32 * LEVEL_MAX / 0xFF
}

/// Stage for a voice `elapsed` sample periods after its last reset.
pub fn stage(envelope: &Envelope, enabled: bool, elapsed: u32) -> AdsrStage {
    let attack = envelope.attack as u32;
    let decay = envelope.decay as u32;
    if !enabled {
        if elapsed < envelope.release as u32 {
            AdsrStage::Release
        } else {
            AdsrStage::Silent
        }
    } else if elapsed < attack {
        AdsrStage::Attack
    } else if elapsed < attack + decay {
        AdsrStage::Decay
    } else {
        AdsrStage::Sustain
    }
}

/// Envelope multiplier in `[0, LEVEL_MAX]`.
pub fn level(envelope: &Envelope, enabled: bool, elapsed: u32, release_start: u16) -> u16 {
    let attack = envelope.attack as u32;
    let decay = envelope.decay as u32;
    let release = envelope.release as u32;
    let sustain = sustain_level(envelope);

    let level = match stage(envelope, enabled, elapsed) {
        AdsrStage::Attack => LEVEL_MAX * elapsed / attack,
        AdsrStage::Decay => LEVEL_MAX - (LEVEL_MAX - sustain) * (elapsed - attack) / decay,
        AdsrStage::Sustain => sustain,
        AdsrStage::Release => release_start as u32 * (release - elapsed) / release,
        AdsrStage::Silent => 0,
    };
    level.min(LEVEL_MAX) as u16
}
