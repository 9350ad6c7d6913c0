//! The two records propagated from the control plane to the synthesis plane.

use crate::envelope::Envelope;
use crate::instrument::Instrument;
use crate::limits::{ChannelIndex, NoteIndex, Velocity, N_MIDI_CHANNELS};

/// State shared by all generators.
///
/// The control plane's copy is authoritative; the synthesis plane's copy is
/// overwritten wholesale by every global-state packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlobalState {
    /// From 0 to 0xFF.
    pub master_volume: u8,
    pub envelope: Envelope,
    /// Per-channel pitch bend, centered at zero. The drum channel's entry is
    /// never written.
    pub pitch_bends: [i8; N_MIDI_CHANNELS],
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            master_volume: 0xFF >> 1,
            envelope: Envelope::default(),
            pitch_bends: [0; N_MIDI_CHANNELS],
        }
    }
}

impl GlobalState {
    /// Pitch bend for a channel; out-of-range channels read as unbent.
    pub fn pitch_bend(&self, channel: ChannelIndex) -> i8 {
        self.pitch_bends.get(channel as usize).copied().unwrap_or(0)
    }
}

/// What one generator slot should be playing, as seen by the control plane.
///
/// While two slots are both enabled they never share a `(note, channel)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoiceAssignment {
    /// Whether the generator is held. A disabled slot may still be sounding
    /// its release tail.
    pub enabled: bool,
    pub instrument: Instrument,
    pub note: NoteIndex,
    /// Selects which pitch bend applies.
    pub channel: ChannelIndex,
    pub velocity: Velocity,
}

impl VoiceAssignment {
    /// Does this slot currently hold `note` on `channel`?
    pub fn holds(&self, note: NoteIndex, channel: ChannelIndex) -> bool {
        self.enabled && self.note == note && self.channel == channel
    }
}
