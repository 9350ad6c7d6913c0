//! Audio output backends for the twinplane synthesizer.

mod cpal_backend;
mod traits;

pub use cpal_backend::CpalOutput;
pub use traits::{sample_to_f32, AudioError, AudioOutput};
