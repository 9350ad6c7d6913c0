//! Offline session: both planes in one thread.
//!
//! Packets produced by each control event are applied to the engine before
//! the next sample is rendered, which models a link with zero latency.

use log::debug;
use tp_control::ControlPlane;
use tp_engine::Engine;
use tp_ir::{Envelope, GlobalState, Instrument, WideSample};
use tp_wire::PacketBuf;

use crate::script::ScriptStep;

pub struct Session {
    control: ControlPlane<Vec<PacketBuf>>,
    engine: Engine,
    discarded: usize,
}

impl Session {
    /// Start a session and push the initial global state to the engine.
    pub fn new(global: GlobalState, instrument: Instrument) -> Self {
        let mut control = ControlPlane::with_state(global, Vec::new());
        control.set_instrument(instrument);
        control.push_global_state();
        let mut session = Self {
            control,
            engine: Engine::new(),
            discarded: 0,
        };
        session.deliver();
        session
    }

    pub fn control(&self) -> &ControlPlane<Vec<PacketBuf>> {
        &self.control
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Packets the engine rejected so far.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn midi_event(&mut self, data: &[u8]) {
        self.control.handle_midi_event(data);
        self.deliver();
    }

    pub fn set_master_volume(&mut self, volume: u8) {
        self.control.set_master_volume(volume);
        self.deliver();
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.control.set_envelope(envelope);
        self.deliver();
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.control.set_instrument(instrument);
    }

    /// Render `count` samples onto the end of `out`.
    pub fn render(&mut self, count: usize, out: &mut Vec<WideSample>) {
        let start = out.len();
        out.resize(start + count, 0);
        self.engine.render_into(&mut out[start..]);
    }

    /// Apply one script step, appending any rendered samples to `out`.
    pub fn apply_step(&mut self, step: &ScriptStep, out: &mut Vec<WideSample>) {
        match step {
            ScriptStep::Midi(bytes) => self.midi_event(bytes),
            ScriptStep::Samples(count) => self.render(*count, out),
            ScriptStep::Instrument(instrument) => self.set_instrument(*instrument),
            ScriptStep::Volume(volume) => self.set_master_volume(*volume),
            ScriptStep::Envelope(envelope) => self.set_envelope(*envelope),
        }
    }

    /// Run a whole script and return everything it rendered.
    pub fn run_script(&mut self, steps: &[ScriptStep]) -> Vec<WideSample> {
        let mut out = Vec::with_capacity(crate::script::total_samples(steps));
        for step in steps {
            self.apply_step(step, &mut out);
        }
        out
    }

    fn deliver(&mut self) {
        for packet in self.control.sink_mut().drain(..) {
            if let Err(e) = self.engine.handle_packet(&packet) {
                debug!("engine discarded packet: {}", e);
                self.discarded += 1;
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GlobalState::default(), Instrument::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_ir::SAMPLE_RATE;

    #[test]
    fn new_session_pushes_global_state() {
        let global = GlobalState {
            master_volume: 0x40,
            ..Default::default()
        };
        let session = Session::new(global, Instrument::Sine);
        assert_eq!(*session.engine().global(), global);
        assert_eq!(session.control().instrument(), Instrument::Sine);
    }

    #[test]
    fn silence_without_notes() {
        let mut session = Session::default();
        let mut out = Vec::new();
        session.render(100, &mut out);
        assert_eq!(out.len(), 100);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn note_sounds_then_stops() {
        let mut session = Session::default();
        let out = session.run_script(&[
            ScriptStep::Midi(vec![0x90, 69, 0x7F]),
            ScriptStep::Samples(1000),
            ScriptStep::Midi(vec![0x80, 69, 0]),
            ScriptStep::Samples(10),
        ]);
        assert_eq!(out.len(), 1010);
        assert!(out[..1000].iter().any(|&s| s != 0));
        assert!(out[1001..].iter().all(|&s| s == 0));
        assert_eq!(session.discarded(), 0);
    }

    #[test]
    fn volume_step_reaches_engine() {
        let mut session = Session::default();
        session.run_script(&[ScriptStep::Volume(3)]);
        assert_eq!(session.engine().global().master_volume, 3);
    }

    #[test]
    fn envelope_step_reaches_engine() {
        let mut session = Session::default();
        let envelope = Envelope::new(10, 20, 30, 40);
        session.run_script(&[ScriptStep::Envelope(envelope)]);
        assert_eq!(session.engine().global().envelope, envelope);
    }

    #[test]
    fn instrument_step_applies_to_next_note() {
        let mut session = Session::default();
        session.run_script(&[
            ScriptStep::Instrument(Instrument::Triangle),
            ScriptStep::Midi(vec![0x90, 60, 100]),
        ]);
        let voice = session.engine().voice(0).unwrap();
        assert_eq!(voice.assignment.instrument, Instrument::Triangle);
    }

    #[test]
    fn one_second_script() {
        let mut session = Session::default();
        let out = session.run_script(&[
            ScriptStep::Midi(vec![0x90, 0x30, 0x7F]),
            ScriptStep::Samples(SAMPLE_RATE as usize),
        ]);
        assert_eq!(out.len(), SAMPLE_RATE as usize);
        assert_eq!(session.engine().clock(), SAMPLE_RATE as u64);
    }
}
