//! Audio decoding through symphonia
//!
//! Works for audio files and for the audio track of video containers.
//! The format reader and decoder are owned by `decode_audio_file` and are
//! dropped when it returns, on success or error.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::Pcm16;
use crate::audio_clean::gain::f32_to_pcm16;
use crate::error::{PipelineError, PipelineResult};

/// Interleaved, normalized f32 samples
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn to_pcm16(&self) -> Pcm16 {
        Pcm16::new(f32_to_pcm16(&self.samples), self.sample_rate, self.channels)
    }
}

/// Decode the first audio track of `path` in full.
pub fn decode_audio_file(path: &Path) -> PipelineResult<DecodedAudio> {
    if !path.exists() {
        return Err(PipelineError::SourceNotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    // Gapless trims the encoder delay and padding recorded in an MP3's LAME tag
    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| PipelineError::Probe(format!("{}: {}", path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| PipelineError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => {
                return Err(PipelineError::Decode(format!("Error reading packet: {}", e)))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(PipelineError::Decode(format!("Decode error: {}", e))),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(PipelineError::EmptyAudio(format!(
            "no samples decoded from {}",
            path.display()
        )));
    }

    let sample_rate = sample_rate.ok_or_else(|| {
        PipelineError::Decode(format!("Unknown sample rate in {}", path.display()))
    })?;
    let channels = channels.unwrap_or(1).max(1);

    if skipped_packets > 0 {
        log::warn!("{} corrupt packets skipped in {}", skipped_packets, path.display());
    }

    let audio = DecodedAudio {
        samples,
        sample_rate,
        channels,
    };

    log::debug!(
        "Decoded {}: {} Hz, {} ch, {:.2}s",
        path.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs()
    );

    Ok(audio)
}
