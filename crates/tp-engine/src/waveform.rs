//! Waveform generators.
//!
//! Each generator maps a phase position within one wavelength to a signed
//! sample in `[-SAMPLE_MAX, SAMPLE_MAX]`.

use tp_ir::{Instrument, Sample, SAMPLE_MAX};

/// Entries in one full sine cycle.
pub const SINE_TABLE_LEN: usize = 256;

const QUARTER: usize = SINE_TABLE_LEN / 4;

/// `round(SAMPLE_MAX * sin(2π * i / 256))` for the first quarter cycle,
/// both endpoints included.
const SINE_QUARTER: [Sample; QUARTER + 1] = [
    0, 804, 1608, 2410, 3212, 4011, 4808, 5602,
    6393, 7179, 7962, 8739, 9512, 10278, 11039, 11793,
    12539, 13279, 14010, 14732, 15446, 16151, 16846, 17530,
    18204, 18868, 19519, 20159, 20787, 21403, 22005, 22594,
    23170, 23731, 24279, 24811, 25329, 25832, 26319, 26790,
    27245, 27683, 28105, 28510, 28898, 29268, 29621, 29956,
    30273, 30571, 30852, 31113, 31356, 31580, 31785, 31971,
    32137, 32285, 32412, 32521, 32609, 32678, 32728, 32757,
    32767,
];

/// One entry of the full-cycle sine table, reconstructed from the quarter wave.
pub fn sine_lookup(index: usize) -> Sample {
    let index = index % SINE_TABLE_LEN;
    let offset = index % QUARTER;
    match index / QUARTER {
        0 => SINE_QUARTER[offset],
        1 => SINE_QUARTER[QUARTER - offset],
        2 => -SINE_QUARTER[offset],
        _ => -SINE_QUARTER[QUARTER - offset],
    }
}

/// Produce one sample of `instrument` at `phase` ticks into a `wavelength`.
///
/// `phase` is expected in `[0, wavelength)`; larger values are treated as
/// the last position of the cycle.
pub fn oscillate(instrument: Instrument, phase: u32, wavelength: u32) -> Sample {
    let wavelength = wavelength.max(1) as i64;
    let phase = (phase as i64).min(wavelength - 1);
    let max = SAMPLE_MAX as i64;

    let value = match instrument {
        Instrument::Square => {
            if phase * 2 < wavelength {
                max
            } else {
                -max
            }
        }
        Instrument::Triangle => {
            // Shift by a quarter so the ramp starts at zero, then reflect the
            // second half of the cycle back onto the first.
            let half = (wavelength / 2).max(1);
            let quarter = wavelength / 4;
            let shifted = (phase + quarter) % wavelength;
            let folded = if shifted < half {
                shifted
            } else {
                wavelength - shifted
            };
            (folded * 2 - half) * max / half
        }
        Instrument::Sawtooth => (phase * 2 - wavelength) * max / wavelength,
        Instrument::Sine => {
            return sine_lookup((phase * SINE_TABLE_LEN as i64 / wavelength) as usize);
        }
    };
    value.clamp(-max, max) as Sample
}
