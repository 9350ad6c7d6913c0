//! Standard MIDI file import.
//!
//! Flattens every track into one time-ordered event script, converting
//! ticks to sample periods through the file's tempo map.

use log::trace;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tp_ir::SAMPLE_RATE;

use crate::script::ScriptStep;

/// Tempo in effect until the first tempo event (120 BPM).
const DEFAULT_TEMPO_US: u32 = 500_000;

enum TimedKind {
    Tempo(u32),
    Midi([u8; 3]),
}

struct TimedEvent {
    tick: u64,
    kind: TimedKind,
}

/// Convert a standard MIDI file into an event script.
///
/// Note-on, note-off and pitch-bend messages from all tracks are kept;
/// everything else is dropped. Timing is rounded to whole sample periods
/// without accumulating drift.
pub fn script_from_midi(data: &[u8]) -> Result<Vec<ScriptStep>, midly::Error> {
    let smf = Smf::parse(data)?;

    let mut events = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            let kind = match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    TimedKind::Tempo(tempo.as_int())
                }
                TrackEventKind::Midi { channel, message } => {
                    match channel_bytes(channel.as_int(), message) {
                        Some(bytes) => TimedKind::Midi(bytes),
                        None => {
                            trace!("skipping MIDI file message {:?}", message);
                            continue;
                        }
                    }
                }
                _ => continue,
            };
            events.push(TimedEvent { tick, kind });
        }
    }
    // Stable, so simultaneous events keep track order.
    events.sort_by_key(|e| e.tick);

    let mut steps = Vec::new();
    let mut tempo_us = DEFAULT_TEMPO_US;
    let mut last_tick: u64 = 0;
    let mut position = 0.0f64;
    let mut emitted: usize = 0;

    for event in events {
        let delta = event.tick - last_tick;
        last_tick = event.tick;
        position +=
            delta as f64 * seconds_per_tick(smf.header.timing, tempo_us) * SAMPLE_RATE as f64;

        let target = position.round() as usize;
        if target > emitted {
            steps.push(ScriptStep::Samples(target - emitted));
            emitted = target;
        }

        match event.kind {
            TimedKind::Tempo(t) => tempo_us = t,
            TimedKind::Midi(bytes) => steps.push(ScriptStep::Midi(bytes.to_vec())),
        }
    }

    Ok(steps)
}

fn seconds_per_tick(timing: Timing, tempo_us: u32) -> f64 {
    match timing {
        Timing::Metrical(tpb) => tempo_us as f64 / 1_000_000.0 / tpb.as_int().max(1) as f64,
        Timing::Timecode(fps, subframes) => 1.0 / (fps.as_f32() as f64 * subframes.max(1) as f64),
    }
}

fn channel_bytes(channel: u8, message: MidiMessage) -> Option<[u8; 3]> {
    match message {
        MidiMessage::NoteOff { key, vel } => Some([0x80 | channel, key.as_int(), vel.as_int()]),
        MidiMessage::NoteOn { key, vel } => Some([0x90 | channel, key.as_int(), vel.as_int()]),
        MidiMessage::PitchBend { bend } => {
            let raw = bend.0.as_int();
            Some([0xE0 | channel, (raw & 0x7F) as u8, (raw >> 7) as u8])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a single-track SMF with 96 ticks per quarter note.
    fn smf(track: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 1, 0, 96]);
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(track.len() as u32 + 4).to_be_bytes());
        data.extend_from_slice(track);
        data.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        data
    }

    #[test]
    fn one_beat_at_default_tempo() {
        let data = smf(&[
            0x00, 0x90, 0x3C, 0x64, // note on
            0x60, 0x80, 0x3C, 0x00, // 96 ticks later, note off
        ]);
        let steps = script_from_midi(&data).unwrap();
        assert_eq!(
            steps,
            vec![
                ScriptStep::Midi(vec![0x90, 0x3C, 0x64]),
                ScriptStep::Samples(22050),
                ScriptStep::Midi(vec![0x80, 0x3C, 0x00]),
            ]
        );
    }

    #[test]
    fn tempo_events_change_timing() {
        let data = smf(&[
            0x00, 0xFF, 0x51, 0x03, 0x03, 0xD0, 0x90, // 250000us per beat
            0x00, 0x91, 0x40, 0x50, // note on, channel 1
            0x60, 0xE1, 0x00, 0x40, // one beat later, centered bend
        ]);
        let steps = script_from_midi(&data).unwrap();
        assert_eq!(
            steps,
            vec![
                ScriptStep::Midi(vec![0x91, 0x40, 0x50]),
                ScriptStep::Samples(11025),
                ScriptStep::Midi(vec![0xE1, 0x00, 0x40]),
            ]
        );
    }

    #[test]
    fn other_messages_dropped() {
        let data = smf(&[
            0x00, 0xB0, 0x07, 0x64, // volume controller
            0x00, 0xC0, 0x05, // program change
        ]);
        assert!(script_from_midi(&data).unwrap().is_empty());
    }

    #[test]
    fn garbage_rejected() {
        assert!(script_from_midi(b"not a midi file").is_err());
    }
}
