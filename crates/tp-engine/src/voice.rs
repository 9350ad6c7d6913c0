//! Per-generator registers and the per-sample voice computation.

use tp_ir::{GlobalState, Sample, VoiceAssignment, VELOCITY_MAX};

use crate::envelope::{self, AdsrStage, LEVEL_MAX};
use crate::frequency::{
    apply_pitch_bend, frequency_to_wavelength, note_to_frequency, LIFE_SHIFT, LIFE_STEP,
};
use crate::waveform::oscillate;

/// One generator on the synthesis plane.
///
/// `assignment` mirrors the last generator packet received for this slot.
/// The remaining registers are private to the synthesis plane and are never
/// transmitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceRegisters {
    pub assignment: VoiceAssignment,
    /// Ticks since the last reset; indexes the envelope.
    life: u32,
    /// Position within the current wavelength, in ticks.
    phase: u32,
    /// Envelope level of the most recent held sample; release starts here.
    release_level: u16,
}

impl VoiceRegisters {
    pub const fn new() -> Self {
        Self {
            assignment: VoiceAssignment {
                enabled: false,
                instrument: tp_ir::Instrument::Square,
                note: 0,
                channel: 0,
                velocity: 0,
            },
            life: 0,
            phase: 0,
            release_level: 0,
        }
    }

    /// Ticks since the last reset.
    pub fn life(&self) -> u32 {
        self.life
    }

    /// Whole sample periods since the last reset.
    pub fn elapsed_samples(&self) -> u32 {
        self.life >> LIFE_SHIFT
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn release_level(&self) -> u16 {
        self.release_level
    }

    /// Zero elapsed life and phase. The latched release level is kept so a
    /// note-off can ramp down from it.
    pub fn reset(&mut self) {
        self.life = 0;
        self.phase = 0;
    }

    /// Current envelope stage.
    pub fn stage(&self, global: &GlobalState) -> AdsrStage {
        envelope::stage(
            &global.envelope,
            self.assignment.enabled,
            self.elapsed_samples(),
        )
    }

    /// Whether the voice would produce non-zero output on its next sample.
    pub fn is_sounding(&self, global: &GlobalState) -> bool {
        match self.stage(global) {
            AdsrStage::Silent => false,
            AdsrStage::Release => self.release_level > 0,
            _ => true,
        }
    }

    /// Wavelength of the assigned note under its channel's pitch bend.
    pub fn wavelength(&self, global: &GlobalState) -> u32 {
        let freq = note_to_frequency(self.assignment.note);
        let bent = apply_pitch_bend(freq, global.pitch_bend(self.assignment.channel));
        frequency_to_wavelength(bent)
    }

    /// Wrap the phase to zero if a note change or bend shrank the wavelength
    /// below it. Returns the current wavelength.
    pub fn fit_phase(&mut self, global: &GlobalState) -> u32 {
        let wavelength = self.wavelength(global);
        if self.phase >= wavelength {
            self.phase = 0;
        }
        wavelength
    }

    /// Produce this voice's sample for the current period, then advance
    /// elapsed life and phase by one period.
    pub fn render(&mut self, global: &GlobalState) -> Sample {
        let wavelength = self.fit_phase(global);

        let enabled = self.assignment.enabled;
        let level = envelope::level(
            &global.envelope,
            enabled,
            self.elapsed_samples(),
            self.release_level,
        );
        if enabled {
            self.release_level = level;
        }

        let sample = if level == 0 {
            0
        } else {
            let wave = oscillate(self.assignment.instrument, self.phase, wavelength) as i32;
            let velocity = self.assignment.velocity.min(VELOCITY_MAX) as i32;
            wave * level as i32 / LEVEL_MAX as i32 * velocity / VELOCITY_MAX as i32
        };

        self.advance(wavelength);
        sample as Sample
    }

    fn advance(&mut self, wavelength: u32) {
        self.life = self.life.saturating_add(LIFE_STEP);
        self.phase += LIFE_STEP;
        if self.phase >= wavelength {
            self.phase = 0;
        }
    }
}
