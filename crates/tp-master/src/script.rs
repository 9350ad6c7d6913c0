//! Event scripts: a line-oriented score for offline rendering.
//!
//! ```text
//! # comment
//! instrument sine
//! volume 127
//! envelope 10 200 128 300   # attack ms, decay ms, sustain level, release ms
//! midi 90 30 7f             # raw MIDI bytes in hex
//! samples 44100             # render this many sample periods
//! ```

use tp_ir::{Envelope, Instrument};

/// One step of an event script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    /// Feed raw bytes to the control plane's MIDI entry point.
    Midi(Vec<u8>),
    /// Render this many samples.
    Samples(usize),
    Instrument(Instrument),
    Volume(u8),
    Envelope(Envelope),
}

/// A script line that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Parse a whole script.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let step = parse_line(line).map_err(|message| ScriptError {
            line: index + 1,
            message,
        })?;
        steps.push(step);
    }
    Ok(steps)
}

/// Total number of samples a script renders.
pub fn total_samples(steps: &[ScriptStep]) -> usize {
    steps
        .iter()
        .map(|step| match step {
            ScriptStep::Samples(n) => *n,
            _ => 0,
        })
        .sum()
}

fn parse_line(line: &str) -> Result<ScriptStep, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    let args: Vec<&str> = words.collect();

    match command {
        "midi" => {
            if args.is_empty() {
                return Err("midi needs at least one byte".to_string());
            }
            let bytes = args
                .iter()
                .map(|word| {
                    u8::from_str_radix(word, 16).map_err(|_| format!("bad hex byte '{}'", word))
                })
                .collect::<Result<Vec<u8>, String>>()?;
            Ok(ScriptStep::Midi(bytes))
        }
        "samples" => {
            let [count]: [&str; 1] = exact_args(command, &args)?;
            Ok(ScriptStep::Samples(parse_number(count)?))
        }
        "instrument" => {
            let [name]: [&str; 1] = exact_args(command, &args)?;
            Instrument::from_name(name)
                .map(ScriptStep::Instrument)
                .ok_or_else(|| format!("unknown instrument '{}'", name))
        }
        "volume" => {
            let [volume]: [&str; 1] = exact_args(command, &args)?;
            Ok(ScriptStep::Volume(parse_number(volume)?))
        }
        "envelope" => {
            let [attack, decay, sustain, release]: [&str; 4] = exact_args(command, &args)?;
            Ok(ScriptStep::Envelope(Envelope::from_millis(
                parse_number(attack)?,
                parse_number(decay)?,
                parse_number(sustain)?,
                parse_number(release)?,
            )))
        }
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn exact_args<'a, const N: usize>(
    command: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], String> {
    <[&str; N]>::try_from(args).map_err(|_| {
        format!(
            "{} takes {} argument{}, got {}",
            command,
            N,
            if N == 1 { "" } else { "s" },
            args.len()
        )
    })
}

fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("bad number '{}'", word))
}
