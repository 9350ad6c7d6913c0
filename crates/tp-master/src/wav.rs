//! WAV encoding for 32-bit mono PCM.

use std::io::Write;
use tp_ir::WideSample;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 32;

pub fn write_wav(
    w: &mut impl Write,
    samples: &[WideSample],
    sample_rate: u32,
) -> std::io::Result<()> {
    let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
    let data_size = samples.len() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, sample_rate, block_align)?;
    write_data_chunk(w, samples, data_size)
}

pub fn samples_to_wav(samples: &[WideSample], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + samples.len() * 4);
    write_wav(&mut buf, samples, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write, sample_rate: u32, block_align: u16) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&NUM_CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())
}

fn write_data_chunk(
    w: &mut impl Write,
    samples: &[WideSample],
    data_size: u32,
) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for sample in samples {
        w.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}
