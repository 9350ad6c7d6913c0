//! Waveform selector.

/// Which waveform a generator produces.
///
/// The discriminant is the value carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Instrument {
    #[default]
    Square = 0,
    Triangle = 1,
    Sawtooth = 2,
    Sine = 3,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Square,
        Instrument::Triangle,
        Instrument::Sawtooth,
        Instrument::Sine,
    ];

    /// Wire code for this instrument.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode a wire code. Unknown codes yield `None`.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Instrument::Square),
            1 => Some(Instrument::Triangle),
            2 => Some(Instrument::Sawtooth),
            3 => Some(Instrument::Sine),
            _ => None,
        }
    }

    /// Look up an instrument by its lowercase name (as used by the CLI).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "square" => Some(Instrument::Square),
            "triangle" => Some(Instrument::Triangle),
            "sawtooth" | "saw" => Some(Instrument::Sawtooth),
            "sine" => Some(Instrument::Sine),
            _ => None,
        }
    }
}
