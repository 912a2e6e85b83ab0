//! Minimal WAV container for raw PCM returned by the speech synthesizer.

use std::io;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{PipelineError, PipelineResult};

pub const CHANNELS: u16 = 1;
pub const SAMPLE_RATE: u32 = 22050;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Wrap little-endian 16-bit mono PCM into a WAV file.
pub fn write_pcm_wav(path: &Path, pcm: &[u8]) -> PipelineResult<()> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut writer =
        WavWriter::create(path, spec).map_err(|e| PipelineError::io(path, io::Error::other(e)))?;
    for sample in pcm.chunks_exact(2) {
        let value = i16::from_le_bytes([sample[0], sample[1]]);
        writer
            .write_sample(value)
            .map_err(|e| PipelineError::io(path, io::Error::other(e)))?;
    }
    writer
        .finalize()
        .map_err(|e| PipelineError::io(path, io::Error::other(e)))
}
