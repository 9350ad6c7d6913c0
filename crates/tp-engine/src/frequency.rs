//! Fixed-point pitch arithmetic.
//!
//! Frequencies are carried as Hz scaled by `2^FREQ_SHIFT`. Elapsed life and
//! phase are counted in ticks, `LIFE_STEP` ticks per sample period, so a
//! wavelength keeps some sub-sample precision without any division on the
//! per-sample path beyond the one wavelength computation.

use tp_ir::{N_MIDI_KEYS, SAMPLE_RATE};

/// Fractional bits of a fixed-point frequency.
pub const FREQ_SHIFT: u32 = 10;

/// Ticks per sample period, as a power of two.
pub const LIFE_SHIFT: u32 = 4;

/// Amount elapsed life and phase advance every sample period.
pub const LIFE_STEP: u32 = 1 << LIFE_SHIFT;

/// Fractional bits of the pitch-bend multiplier.
pub const BEND_SHIFT: u32 = 16;

/// Semitones reached at full pitch-bend deflection.
pub const BEND_RANGE_SEMITONES: u32 = 2;

/// Multiplier step per unit of bend: `round((2^(2/12) - 1) * 2^16 / 128)`.
pub const BEND_SCALE: i64 = 63;

const BEND_OFFSET: i64 = 1 << BEND_SHIFT;

/// `round(440 * 2^((n - 58) / 12) * 2^FREQ_SHIFT)` for every MIDI note `n`.
const NOTE_FREQUENCIES: [u32; N_MIDI_KEYS] = [
    15804, 16744, 17740, 18795, 19912, 21096, 22351, 23680,
    25088, 26580, 28160, 29834, 31609, 33488, 35479, 37589,
    39824, 42192, 44701, 47359, 50175, 53159, 56320, 59669,
    63217, 66976, 70959, 75178, 79649, 84385, 89402, 94719,
    100351, 106318, 112640, 119338, 126434, 133952, 141918, 150356,
    159297, 168769, 178805, 189437, 200702, 212636, 225280, 238676,
    252868, 267905, 283835, 300713, 318594, 337539, 357610, 378874,
    401403, 425272, 450560, 477352, 505737, 535809, 567670, 601425,
    637188, 675077, 715219, 757749, 802807, 850544, 901120, 954703,
    1011473, 1071618, 1135340, 1202851, 1274376, 1350154, 1430439, 1515497,
    1605613, 1701088, 1802240, 1909407, 2022946, 2143237, 2270680, 2405702,
    2548752, 2700309, 2860878, 3030994, 3211227, 3402176, 3604480, 3818814,
    4045892, 4286473, 4541360, 4811404, 5097505, 5400618, 5721755, 6061989,
    6422453, 6804352, 7208960, 7637627, 8091784, 8572947, 9082720, 9622807,
    10195009, 10801236, 11443511, 12123977, 12844906, 13608704, 14417920, 15275254,
    16183568, 17145893, 18165441, 19245614, 20390018, 21602472, 22887021, 24247954,
];

/// Equal-tempered frequency of a MIDI note, fixed-point.
///
/// Indices above 127 read as note 127.
pub fn note_to_frequency(note: u8) -> u32 {
    NOTE_FREQUENCIES[(note as usize).min(N_MIDI_KEYS - 1)]
}

/// Scale a fixed-point frequency by a pitch bend.
///
/// Linear approximation of the exponential bend curve: a bend of ±128
/// lands within a few cents of ±`BEND_RANGE_SEMITONES`. Zero bend returns
/// `freq` exactly.
pub fn apply_pitch_bend(freq: u32, bend: i8) -> u32 {
    let multiplier = bend as i64 * BEND_SCALE + BEND_OFFSET;
    ((freq as i64 * multiplier) >> BEND_SHIFT) as u32
}

/// Period of a fixed-point frequency, in ticks.
///
/// This is the phase accumulator's wrap threshold. Never zero.
pub fn frequency_to_wavelength(freq: u32) -> u32 {
    let scaled_rate = ((SAMPLE_RATE as u64) << FREQ_SHIFT) * LIFE_STEP as u64;
    (scaled_rate / freq.max(1) as u64).clamp(1, u32::MAX as u64) as u32
}
