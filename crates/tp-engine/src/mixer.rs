//! The synthesis plane: packet application and the per-sample mixer.

use alloc::vec::Vec;
use tp_ir::{GlobalState, WideSample, N_GENERATORS};
use tp_wire::{Packet, WireError};

use crate::voice::VoiceRegisters;

/// Left shift applied after master volume.
pub const HEADROOM_SHIFT: u32 = 6;

/// Synthesis-plane state: a replica of the global state plus one register
/// file per generator.
///
/// Packets and samples are both applied through `&mut self`, so a packet can
/// only ever land between two sample periods.
#[derive(Clone, Debug)]
pub struct Engine {
    global: GlobalState,
    voices: [VoiceRegisters; N_GENERATORS],
    /// Sample periods rendered since construction.
    clock: u64,
}

impl Engine {
    /// Create an engine with every generator idle.
    pub fn new() -> Self {
        Self {
            global: GlobalState::default(),
            voices: [VoiceRegisters::new(); N_GENERATORS],
            clock: 0,
        }
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn voice(&self, slot: usize) -> Option<&VoiceRegisters> {
        self.voices.get(slot)
    }

    pub fn voices(&self) -> &[VoiceRegisters] {
        &self.voices
    }

    /// Sample periods rendered so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Count of generators that will produce output on the next sample.
    pub fn sounding_count(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.is_sounding(&self.global))
            .count()
    }

    /// Decode and apply one received packet.
    ///
    /// On error nothing has been modified.
    pub fn handle_packet(&mut self, data: &[u8]) -> Result<(), WireError> {
        let packet = Packet::decode(data)?;
        self.apply(packet)
    }

    /// Apply an already-decoded packet.
    ///
    /// Every phase is left inside its voice's (possibly new) wavelength.
    pub fn apply(&mut self, packet: Packet) -> Result<(), WireError> {
        match packet {
            Packet::Global(state) => {
                self.global = state;
                for voice in &mut self.voices {
                    voice.fit_phase(&self.global);
                }
            }
            Packet::Generator(update) => {
                let voice = self
                    .voices
                    .get_mut(update.slot as usize)
                    .ok_or(WireError::SlotOutOfRange(update.slot))?;
                voice.assignment = update.assignment;
                if update.reset {
                    voice.reset();
                } else {
                    voice.fit_phase(&self.global);
                }
            }
        }
        Ok(())
    }

    /// Render one sample period.
    ///
    /// Every generator is evaluated, and so advanced, exactly once,
    /// whether or not it is sounding.
    pub fn render_sample(&mut self) -> WideSample {
        let global = &self.global;
        let mut acc: i32 = 0;
        for voice in &mut self.voices {
            acc += voice.render(global) as i32;
        }
        self.clock += 1;

        let scaled = (acc as i64 * global.master_volume as i64) << HEADROOM_SHIFT;
        scaled.clamp(WideSample::MIN as i64, WideSample::MAX as i64) as WideSample
    }

    /// Fill `out` with consecutive samples.
    pub fn render_into(&mut self, out: &mut [WideSample]) {
        for sample in out.iter_mut() {
            *sample = self.render_sample();
        }
    }

    /// Render `count` samples (allocates, offline use only).
    pub fn render_samples(&mut self, count: usize) -> Vec<WideSample> {
        let mut out = alloc::vec![0; count];
        self.render_into(&mut out);
        out
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
