//! Render-path benchmarks.
//!
//! Run with `cargo bench -p tp-engine`.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tp_engine::Engine;
use tp_ir::{
    Envelope, GlobalState, Instrument, VoiceAssignment, WideSample, N_GENERATORS, SAMPLE_RATE,
};
use tp_wire::Packet;

fn loaded_engine(instrument: Instrument) -> Engine {
    let mut engine = Engine::new();
    let global = GlobalState {
        envelope: Envelope::from_millis(10, 100, 0xA0, 300),
        ..Default::default()
    };
    engine.handle_packet(&Packet::global(&global)).unwrap();
    for slot in 0..N_GENERATORS {
        let assignment = VoiceAssignment {
            enabled: true,
            instrument,
            note: 40 + slot as u8 * 3,
            channel: (slot % 8) as u8,
            velocity: 100,
        };
        engine
            .handle_packet(&Packet::generator(slot as u16, true, &assignment))
            .unwrap();
    }
    engine
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_one_second");
    for instrument in Instrument::ALL {
        group.bench_function(format!("{:?}", instrument), |b| {
            let mut engine = loaded_engine(instrument);
            let mut out: Vec<WideSample> = vec![0; SAMPLE_RATE as usize];
            b.iter(|| {
                engine.render_into(black_box(&mut out));
            });
        });
    }
    group.finish();
}

fn bench_packets(c: &mut Criterion) {
    let assignment = VoiceAssignment {
        enabled: true,
        instrument: Instrument::Sine,
        note: 60,
        channel: 0,
        velocity: 100,
    };
    let packet = Packet::generator(3, true, &assignment);
    c.bench_function("handle_generator_packet", |b| {
        let mut engine = Engine::new();
        b.iter(|| engine.handle_packet(black_box(&packet)));
    });
}

criterion_group!(benches, bench_render, bench_packets);
criterion_main!(benches);
