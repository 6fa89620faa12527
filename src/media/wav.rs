//! 16-bit PCM WAV intermediates

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::Pcm16;
use crate::audio_clean::gain::{to_pcm16, OverflowMode};
use crate::error::{PipelineError, PipelineResult};

pub fn write_pcm16(path: &Path, pcm: &Pcm16) -> PipelineResult<()> {
    let spec = WavSpec {
        channels: pcm.channels,
        sample_rate: pcm.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in &pcm.samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    log::debug!(
        "Wrote WAV {} ({} Hz, {} ch, {:.2}s)",
        path.display(),
        pcm.sample_rate,
        pcm.channels,
        pcm.duration_secs()
    );
    Ok(())
}

/// Read a WAV file as 16-bit PCM, converting other integer depths and float.
pub fn read_pcm16(path: &Path) -> PipelineResult<Pcm16> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut reader = WavReader::new(BufReader::new(file))?;
    let spec = reader.spec();

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.samples::<i16>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| (v as i16) << 8))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ 17..=32) => {
            let shift = bits - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<Result<_, _>>()?
        }
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| to_pcm16(v * 32768.0, OverflowMode::Clip)))
            .collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(PipelineError::MalformedAudio(format!(
                "unsupported WAV sample format {:?} at {} bits",
                format, bits
            )))
        }
    };

    Ok(Pcm16::new(samples, spec.sample_rate, spec.channels))
}
