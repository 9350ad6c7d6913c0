//! twinplane CLI: offline WAV rendering and live playback of event scripts.
//!
//! Usage:
//!   cargo run --bin tp-cli -- score.txt
//!   cargo run --bin tp-cli -- song.mid --wav output.wav --instrument saw
//!
//! Set `RUST_LOG=debug` to see dropped notes and discarded packets.

use std::io::Write;
use std::path::Path;
use std::{env, fs};
use tp_master::{
    load_steps, samples_to_wav, total_samples, Controller, Envelope, GlobalState, Instrument,
    ScriptStep, Session, SAMPLE_RATE,
};

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

const USAGE: &str = "Usage: tp-cli <score.txt|song.mid> [--wav output.wav] \
[--instrument square|triangle|saw|sine] [--volume 0-255] \
[--attack ms] [--decay ms] [--sustain 0-255] [--release ms] [--tail samples]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).filter(|a| !a.starts_with("--")).unwrap_or_else(|| {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    });

    let wav_path = flag(&args, "--wav");
    let instrument = match flag(&args, "--instrument") {
        Some(name) => Instrument::from_name(&name).unwrap_or_else(|| {
            eprintln!("Unknown instrument '{}'", name);
            std::process::exit(1);
        }),
        None => Instrument::default(),
    };

    let defaults = GlobalState::default();
    let global = GlobalState {
        master_volume: number_flag(&args, "--volume").unwrap_or(defaults.master_volume),
        envelope: Envelope::from_millis(
            number_flag(&args, "--attack").unwrap_or(0),
            number_flag(&args, "--decay").unwrap_or(0),
            number_flag(&args, "--sustain").unwrap_or(defaults.envelope.sustain),
            number_flag(&args, "--release").unwrap_or(0),
        ),
        ..defaults
    };
    let tail: usize = number_flag(&args, "--tail").unwrap_or(SAMPLE_RATE as usize);

    let mut steps = load_steps(Path::new(path)).unwrap_or_else(|e| {
        eprintln!("Failed to load {}: {}", path, e);
        std::process::exit(1);
    });
    steps.push(ScriptStep::Samples(tail));

    let samples = total_samples(&steps);
    println!("Score:      {}", path);
    println!("Steps:      {}", steps.len());
    println!(
        "Length:     {} samples ({:.2} s)",
        samples,
        samples as f64 / SAMPLE_RATE as f64
    );
    println!("Instrument: {:?}", instrument);
    println!(
        "Envelope:   A {} D {} S {:#04X} R {} (samples)",
        global.envelope.attack,
        global.envelope.decay,
        global.envelope.sustain,
        global.envelope.release
    );
    println!();

    match wav_path {
        Some(wav) => render_to_wav(global, instrument, &steps, &wav),
        None => play_audio(global, instrument, &steps),
    }
}

fn flag(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn number_flag<T: std::str::FromStr>(args: &[String], name: &str) -> Option<T> {
    let value = flag(args, name)?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("Bad value for {}: '{}'", name, value);
            std::process::exit(1);
        }
    }
}

fn play_audio(global: GlobalState, instrument: Instrument, steps: &[ScriptStep]) {
    let mut ctrl = Controller::new(global, instrument);
    ctrl.play().unwrap_or_else(|e| {
        eprintln!("Failed to start playback: {}", e);
        std::process::exit(1);
    });
    println!("Playing...");

    ctrl.play_script(steps);
    print!("\r{} samples played", ctrl.samples_rendered());
    let _ = std::io::stdout().flush();
    ctrl.stop();

    println!("\nDone.");
}

fn render_to_wav(global: GlobalState, instrument: Instrument, steps: &[ScriptStep], path: &str) {
    println!("Rendering to {} at {} Hz...", path, SAMPLE_RATE);

    let mut session = Session::new(global, instrument);
    let samples = session.run_script(steps);
    if session.discarded() > 0 {
        log::warn!("{} packets discarded by the engine", session.discarded());
    }

    let wav = samples_to_wav(&samples, SAMPLE_RATE);
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    });

    println!("Done.");
}
