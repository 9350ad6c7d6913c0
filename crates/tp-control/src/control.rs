//! ControlPlane: MIDI event interpretation and state propagation.
//!
//! Owns the authoritative `GlobalState` and voice assignments. Each incoming
//! event is handled to completion before the next; every branch that changes
//! state sends exactly one packet, and every branch that doesn't sends none.

use log::{debug, trace};
use tp_ir::{
    ChannelIndex, Envelope, GlobalState, Instrument, NoteIndex, Velocity, DRUM_CHANNEL,
    N_GENERATORS,
};
use tp_wire::Packet;

use crate::midi::{bend_to_wire, MidiMessage};
use crate::sink::PacketSink;
use crate::voice_pool::VoicePool;

/// The control-plane interpreter.
pub struct ControlPlane<S> {
    global: GlobalState,
    pool: VoicePool,
    /// Instrument given to newly started notes.
    instrument: Instrument,
    sink: S,
}

impl<S: PacketSink> ControlPlane<S> {
    /// Create a control plane with the default global state and an empty pool.
    ///
    /// Nothing is sent; call [`resync`](Self::resync) if the receiver may
    /// hold stale state.
    pub fn new(sink: S) -> Self {
        Self::with_state(GlobalState::default(), sink)
    }

    pub fn with_state(global: GlobalState, sink: S) -> Self {
        Self {
            global,
            pool: VoicePool::new(),
            instrument: Instrument::default(),
            sink,
        }
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Interpret one raw MIDI message.
    ///
    /// Malformed messages, drum-channel traffic and unsupported message
    /// types are dropped without sending anything.
    pub fn handle_midi_event(&mut self, data: &[u8]) {
        let Some(message) = MidiMessage::parse(data) else {
            trace!("discarding malformed MIDI message {:02X?}", data);
            return;
        };

        if message.channel() == Some(DRUM_CHANNEL) {
            trace!("ignoring drum channel message {:?}", message);
            return;
        }

        match message {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } if velocity > 0 => self.note_on(channel, note, velocity),
            MidiMessage::NoteOn { channel, note, .. } => self.note_off(channel, note, 0),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => self.note_off(channel, note, velocity),
            MidiMessage::PitchBend { channel, value } => self.pitch_bend(channel, value),
            MidiMessage::Other { status } => {
                trace!("ignoring MIDI status {:02X}", status);
            }
        }
    }

    fn note_on(&mut self, channel: ChannelIndex, note: NoteIndex, velocity: Velocity) {
        // A repeated note-on for a held note retriggers its slot so no two
        // enabled slots ever share (note, channel).
        let slot = match self.pool.find_matching(note, channel) {
            Some(slot) => slot,
            None => match self.pool.find_vacant() {
                Some(slot) => slot,
                None => {
                    debug!(
                        "all {} generators busy, dropping note {} on channel {}",
                        N_GENERATORS, note, channel
                    );
                    return;
                }
            },
        };

        let instrument = self.instrument;
        let Some(assignment) = self.pool.get_mut(slot) else {
            return;
        };
        assignment.enabled = true;
        assignment.instrument = instrument;
        assignment.note = note;
        assignment.channel = channel;
        assignment.velocity = velocity;
        self.send_generator(slot, true);
    }

    fn note_off(&mut self, channel: ChannelIndex, note: NoteIndex, velocity: Velocity) {
        let Some(slot) = self.pool.find_matching(note, channel) else {
            debug!("note-off for unheld note {} on channel {}", note, channel);
            return;
        };
        let Some(assignment) = self.pool.get_mut(slot) else {
            return;
        };
        assignment.enabled = false;
        // Keep the last audible velocity for the release tail.
        if velocity > 0 {
            assignment.velocity = velocity;
        }
        self.send_generator(slot, true);
    }

    fn pitch_bend(&mut self, channel: ChannelIndex, value: i16) {
        let Some(bend) = self.global.pitch_bends.get_mut(channel as usize) else {
            return;
        };
        *bend = bend_to_wire(value);
        self.push_global_state();
    }

    /// Change master volume and propagate it.
    pub fn set_master_volume(&mut self, volume: u8) {
        self.global.master_volume = volume;
        self.push_global_state();
    }

    /// Change the shared envelope and propagate it.
    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.global.envelope = envelope;
        self.push_global_state();
    }

    /// Select the instrument for notes started from now on.
    ///
    /// Held notes keep their instrument and nothing is sent.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    /// Send the authoritative global state.
    pub fn push_global_state(&mut self) {
        self.sink.send(Packet::global(&self.global));
    }

    /// Send the global state followed by every slot's assignment, without
    /// resets, so a freshly started receiver matches this control plane.
    pub fn resync(&mut self) {
        self.push_global_state();
        for slot in 0..N_GENERATORS {
            self.send_generator(slot, false);
        }
    }

    fn send_generator(&mut self, slot: usize, reset: bool) {
        if let Some(assignment) = self.pool.get(slot) {
            self.sink
                .send(Packet::generator(slot as u16, reset, assignment));
        }
    }
}
