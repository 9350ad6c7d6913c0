//! Integration test: MIDI in → control plane → wire → engine → samples.

use tp_control::{ControlPlane, PacketSink};
use tp_engine::{AdsrStage, Engine, HEADROOM_SHIFT};
use tp_ir::{
    Envelope, GlobalState, Instrument, VoiceAssignment, WideSample, N_GENERATORS, SAMPLE_RATE,
};
use tp_master::{ScriptStep, Session};
use tp_wire::{Packet, PacketBuf};

const ONE_SECOND: usize = SAMPLE_RATE as usize;

fn session_with(envelope: Envelope, instrument: Instrument) -> Session {
    let global = GlobalState {
        envelope,
        ..Default::default()
    };
    Session::new(global, instrument)
}

fn render(session: &mut Session, count: usize) -> Vec<WideSample> {
    let mut out = Vec::new();
    session.render(count, &mut out);
    out
}

/// Count negative-to-positive transitions.
fn rising_crossings(samples: &[WideSample]) -> usize {
    samples
        .windows(2)
        .filter(|w| w[0] < 0 && w[1] >= 0)
        .count()
}

fn max_amplitude(samples: &[WideSample]) -> WideSample {
    samples.iter().map(|s| s.saturating_abs()).max().unwrap_or(0)
}

fn expected_hz(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 58.0) / 12.0)
}

// --- Concrete scenarios ---

#[test]
fn held_square_note_is_constant_amplitude_at_note_frequency() {
    let mut session = Session::default();
    session.midi_event(&[0x90, 0x30, 0x7F]);
    let out = render(&mut session, ONE_SECOND);

    // Sustain 0x80 at full velocity and master volume 0x7F.
    let voice = 0x80 * 0x7FFF / 0xFF;
    let expected = (voice * 0x7F) << HEADROOM_SHIFT;
    for (i, &s) in out.iter().enumerate() {
        assert_eq!(s.abs(), expected, "sample {} = {}", i, s);
    }

    let cycles = rising_crossings(&out) as f64;
    let hz = expected_hz(0x30);
    assert!((cycles - hz).abs() <= 2.0, "{} cycles, expected ~{}", cycles, hz);

    session.midi_event(&[0x80, 0x30, 0x00]);
    let tail = render(&mut session, 10);
    assert!(tail.iter().all(|&s| s == 0), "tail {:?}", tail);
}

#[test]
fn held_sine_note_oscillates_at_note_frequency() {
    let mut session = session_with(Envelope::default(), Instrument::Sine);
    session.midi_event(&[0x90, 0x30, 0x7F]);
    let out = render(&mut session, ONE_SECOND);

    let cycles = rising_crossings(&out) as f64;
    assert!((cycles - expected_hz(0x30)).abs() <= 2.0, "{} cycles", cycles);

    let peak = (0x80 * 0x7FFF / 0xFF * 0x7F) << HEADROOM_SHIFT;
    let max = max_amplitude(&out);
    assert!(max <= peak && max > peak * 9 / 10, "max {} vs {}", max, peak);
}

#[test]
fn centered_pitch_bend_leaves_output_unchanged() {
    let mut plain = Session::default();
    plain.midi_event(&[0x90, 0x45, 0x60]);
    let unbent = render(&mut plain, 5000);

    let mut bent = Session::default();
    bent.midi_event(&[0xE0, 0x00, 0x40]);
    bent.midi_event(&[0x90, 0x45, 0x60]);
    let centered = render(&mut bent, 5000);

    assert_eq!(unbent, centered);
}

#[test]
fn pitch_bend_up_raises_frequency_by_about_two_semitones() {
    let mut session = Session::default();
    session.midi_event(&[0xE0, 0x7F, 0x7F]);
    session.midi_event(&[0x90, 0x30, 0x7F]);
    let out = render(&mut session, ONE_SECOND);

    let cycles = rising_crossings(&out) as f64;
    let target = expected_hz(0x30 + 2);
    assert!((cycles - target).abs() / target < 0.02, "{} cycles vs {}", cycles, target);
}

#[test]
fn drum_channel_stays_silent() {
    let mut session = Session::default();
    session.midi_event(&[0x99, 0x30, 0x7F]);
    let out = render(&mut session, 1000);
    assert!(out.iter().all(|&s| s == 0));
}

// --- Envelope and phase continuity ---

#[test]
fn release_starts_from_the_level_last_played() {
    // Note-off lands mid-attack.
    let mut session = session_with(Envelope::new(100, 100, 0x80, 1000), Instrument::Square);
    session.midi_event(&[0x90, 60, 0x7F]);
    let held = render(&mut session, 50);
    let latched = session.engine().voice(0).unwrap().release_level();
    assert_eq!(latched as u32, 0x7FFF * 49 / 100);

    session.midi_event(&[0x80, 60, 0]);
    let released = render(&mut session, 1);
    assert_eq!(released[0].abs(), held[49].abs());

    let voice = session.engine().voice(0).unwrap();
    assert_eq!(voice.stage(session.engine().global()), AdsrStage::Release);
    assert_eq!(voice.release_level(), latched);
}

#[test]
fn release_ramps_to_silence_within_release_time() {
    let mut session = session_with(Envelope::new(0, 0, 0xFF, 200), Instrument::Square);
    session.midi_event(&[0x90, 60, 0x7F]);
    render(&mut session, 100);
    session.midi_event(&[0x80, 60, 0]);
    let tail = render(&mut session, 300);

    let amplitudes: Vec<WideSample> = tail.iter().map(|s| s.abs()).collect();
    assert!(amplitudes.windows(2).all(|w| w[1] <= w[0]));
    assert!(amplitudes[..200].iter().all(|&a| a > 0));
    assert!(amplitudes[200..].iter().all(|&a| a == 0));
    assert_eq!(session.engine().sounding_count(), 0);
}

#[test]
fn note_change_without_reset_keeps_phase() {
    let mut engine = Engine::new();
    let mut assignment = VoiceAssignment {
        enabled: true,
        instrument: Instrument::Sawtooth,
        note: 60,
        channel: 0,
        velocity: 100,
    };
    engine
        .handle_packet(&Packet::generator(0, true, &assignment))
        .unwrap();
    engine.render_samples(37);
    let phase = engine.voice(0).unwrap().phase();
    assert_ne!(phase, 0);

    assignment.note = 62;
    engine
        .handle_packet(&Packet::generator(0, false, &assignment))
        .unwrap();
    assert_eq!(engine.voice(0).unwrap().phase(), phase);

    engine.render_sample();
    assert_eq!(engine.voice(0).unwrap().phase(), phase + 16);
}

// --- Control plane and engine stay in agreement ---

fn deliver(control: &mut ControlPlane<Vec<PacketBuf>>, engine: &mut Engine) {
    for packet in control.sink_mut().drain(..) {
        engine.handle_packet(&packet).unwrap();
    }
}

#[test]
fn engine_replica_matches_control_plane() {
    let mut control = ControlPlane::new(Vec::new());
    let mut engine = Engine::new();

    let events: &[&[u8]] = &[
        &[0x90, 60, 100],
        &[0x91, 62, 90],
        &[0xE1, 0x00, 0x60],
        &[0x92, 64, 80],
        &[0x80, 60, 40],
        &[0x90, 67, 70],
        &[0x91, 62, 0],
        &[0xB0, 1, 2],
    ];
    for event in events {
        control.handle_midi_event(event);
        deliver(&mut control, &mut engine);
        engine.render_samples(10);
    }
    control.set_envelope(Envelope::new(5, 6, 7, 8));
    deliver(&mut control, &mut engine);

    assert_eq!(engine.global(), control.global());
    for slot in 0..N_GENERATORS {
        assert_eq!(
            &engine.voice(slot).unwrap().assignment,
            control.pool().get(slot).unwrap(),
            "slot {}",
            slot
        );
    }
}

#[test]
fn seventeenth_note_is_dropped_across_planes() {
    let mut session = session_with(Envelope::default(), Instrument::Sine);
    for note in 0..=N_GENERATORS as u8 {
        session.midi_event(&[0x90, 40 + note, 100]);
    }
    assert_eq!(session.control().pool().active_count(), N_GENERATORS);
    let held: Vec<u8> = session
        .engine()
        .voices()
        .iter()
        .map(|v| v.assignment.note)
        .collect();
    assert!(!held.contains(&(40 + N_GENERATORS as u8)));
    assert_eq!(session.discarded(), 0);
}

#[test]
fn resync_brings_a_fresh_engine_up_to_date() {
    let mut control = ControlPlane::new(Vec::new());
    control.set_master_volume(0x30);
    control.handle_midi_event(&[0x93, 50, 99]);
    control.handle_midi_event(&[0x93, 52, 98]);
    control.sink_mut().clear();

    let mut fresh = Engine::new();
    control.resync();
    deliver(&mut control, &mut fresh);
    assert_eq!(fresh.global().master_volume, 0x30);
    assert_eq!(fresh.voice(1).unwrap().assignment.note, 52);
}

/// A sink that forwards straight into an engine.
struct DirectLink<'a>(&'a mut Engine);

impl PacketSink for DirectLink<'_> {
    fn send(&mut self, packet: PacketBuf) {
        self.0.handle_packet(&packet).unwrap();
    }
}

#[test]
fn round_robin_gives_release_tails_room() {
    let mut engine = Engine::new();
    let envelope = Envelope::new(0, 0, 0xFF, 500);
    let mut control = ControlPlane::with_state(
        GlobalState {
            envelope,
            ..Default::default()
        },
        DirectLink(&mut engine),
    );
    control.push_global_state();

    // Staccato notes never land on the slot just released.
    let mut previous = None;
    for i in 0..40u8 {
        control.handle_midi_event(&[0x90, 50 + (i % 12), 100]);
        let slot = (0..N_GENERATORS)
            .find(|&s| control.pool().get(s).unwrap().enabled)
            .unwrap();
        assert_ne!(Some(slot), previous);
        control.handle_midi_event(&[0x80, 50 + (i % 12), 0]);
        previous = Some(slot);
    }
}

#[test]
fn script_and_direct_events_agree() {
    let steps = [
        ScriptStep::Instrument(Instrument::Triangle),
        ScriptStep::Midi(vec![0x90, 0x40, 0x70]),
        ScriptStep::Samples(300),
        ScriptStep::Midi(vec![0x80, 0x40, 0x00]),
        ScriptStep::Samples(20),
    ];
    let scripted = Session::default().run_script(&steps);

    let mut session = Session::default();
    session.set_instrument(Instrument::Triangle);
    session.midi_event(&[0x90, 0x40, 0x70]);
    let mut direct = render(&mut session, 300);
    session.midi_event(&[0x80, 0x40, 0x00]);
    direct.extend(render(&mut session, 20));

    assert_eq!(scripted, direct);
    assert!(scripted.iter().any(|&s| s != 0));
}
