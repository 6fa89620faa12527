//! MP3 intermediates via LAME

use std::borrow::Cow;
use std::path::Path;

use mp3lame_encoder::{ffi, Builder, FlushGap, InterleavedPcm};

use super::Pcm16;
use crate::audio_clean::channels::{downmix_pcm16_to_mono, mono_to_stereo};
use crate::error::{PipelineError, PipelineResult};

/// Room for the tag frame; the largest MPEG audio frame is 1441 bytes
const MAX_TAG_FRAME_LEN: usize = 4096;

/// Sample rates an MP3 stream can carry (MPEG-1, MPEG-2 and MPEG-2.5)
pub const MP3_SAMPLE_RATES: [u32; 9] = [
    8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000,
];

pub fn is_mp3_sample_rate(rate: u32) -> bool {
    MP3_SAMPLE_RATES.contains(&rate)
}

/// Encode interleaved 16-bit PCM to an MP3 file at the source sample rate.
///
/// The file starts with a LAME Info tag carrying the encoder delay and
/// padding, so a gapless decode returns exactly the frames that went in.
pub fn encode_mp3(path: &Path, pcm: &Pcm16, bitrate_kbps: u32) -> PipelineResult<()> {
    pcm.validate()?;

    if !is_mp3_sample_rate(pcm.sample_rate) {
        return Err(PipelineError::Encode(format!(
            "{} Hz cannot be stored in MP3 (supported: {:?})",
            pcm.sample_rate, MP3_SAMPLE_RATES
        )));
    }

    // InterleavedPcm uses lame_encode_buffer_interleaved which always expects
    // stereo interleaved data. Mono is duplicated; wider layouts fold to mono first.
    let stereo: Cow<[i16]> = match pcm.channels {
        1 => Cow::Owned(mono_to_stereo(&pcm.samples)),
        2 => Cow::Borrowed(pcm.samples.as_slice()),
        n => {
            log::info!("Folding {} channels to mono for MP3 encoding", n);
            Cow::Owned(mono_to_stereo(&downmix_pcm16_to_mono(&pcm.samples, n as usize)))
        }
    };

    let mut mp3_encoder = Builder::new()
        .ok_or_else(|| PipelineError::Encode("Failed to create MP3 encoder".to_string()))?;
    mp3_encoder
        .set_num_channels(2)
        .map_err(|e| PipelineError::Encode(format!("Failed to set channels: {:?}", e)))?;
    mp3_encoder
        .set_sample_rate(pcm.sample_rate)
        .map_err(|e| PipelineError::Encode(format!("Failed to set sample rate: {:?}", e)))?;
    mp3_encoder
        .set_brate(map_bitrate(bitrate_kbps))
        .map_err(|e| PipelineError::Encode(format!("Failed to set bitrate: {:?}", e)))?;
    mp3_encoder
        .set_quality(mp3lame_encoder::Quality::Best)
        .map_err(|e| PipelineError::Encode(format!("Failed to set quality: {:?}", e)))?;
    mp3_encoder
        .set_to_write_vbr_tag(true)
        .map_err(|e| PipelineError::Encode(format!("Failed to enable LAME tag: {:?}", e)))?;

    // The built encoder takes over this handle, so it stays valid while
    // `mp3_encoder` lives.
    let lame = unsafe { mp3_encoder.as_ptr() };

    // Without a fixed output rate LAME downsamples on its own at low bitrates
    let res = unsafe { ffi::lame_set_out_samplerate(lame, pcm.sample_rate as _) };
    if res != 0 {
        return Err(PipelineError::Encode(format!(
            "Failed to set output sample rate {}: code {}",
            pcm.sample_rate, res
        )));
    }

    let mut mp3_encoder = mp3_encoder
        .build()
        .map_err(|e| PipelineError::Encode(format!("Failed to build encoder: {:?}", e)))?;

    // LAME needs roughly 1.25x input + 7200 bytes
    let input = InterleavedPcm(stereo.as_ref());
    let estimated_size = (stereo.len() * 5 / 4) + 7200;
    let mut mp3_out: Vec<u8> = Vec::with_capacity(estimated_size);

    let encoded_size = mp3_encoder
        .encode(input, mp3_out.spare_capacity_mut())
        .map_err(|e| PipelineError::Encode(format!("Failed to encode MP3: {:?}", e)))?;
    unsafe {
        mp3_out.set_len(encoded_size);
    }

    mp3_out.reserve(7200);
    let flush_size = mp3_encoder
        .flush::<FlushGap>(mp3_out.spare_capacity_mut())
        .map_err(|e| PipelineError::Encode(format!("Failed to flush encoder: {:?}", e)))?;
    unsafe {
        mp3_out.set_len(mp3_out.len() + flush_size);
    }

    // LAME reserved the first frame for the tag; fill it in now that the
    // delay, padding and frame count are known.
    let mut tag = [0u8; MAX_TAG_FRAME_LEN];
    let tag_len = unsafe { ffi::lame_get_lametag_frame(lame, tag.as_mut_ptr(), tag.len()) };
    match tag_len {
        0 => {
            return Err(PipelineError::Encode(
                "LAME did not produce an Info tag frame".to_string(),
            ))
        }
        n if n > tag.len() || n > mp3_out.len() => {
            return Err(PipelineError::Encode(format!(
                "LAME tag frame of {} bytes does not fit",
                n
            )))
        }
        n => mp3_out[..n].copy_from_slice(&tag[..n]),
    }

    drop(mp3_encoder);

    std::fs::write(path, &mp3_out).map_err(|e| PipelineError::io(path, e))?;

    log::debug!(
        "Encoded MP3 {} ({} Hz, {:.2}s, {}kbps, {} bytes)",
        path.display(),
        pcm.sample_rate,
        pcm.duration_secs(),
        bitrate_kbps,
        mp3_out.len()
    );

    Ok(())
}

/// Snap a requested bitrate to the nearest LAME-supported step at or above it
fn map_bitrate(bitrate: u32) -> mp3lame_encoder::Bitrate {
    match bitrate {
        0..=32 => mp3lame_encoder::Bitrate::Kbps32,
        33..=40 => mp3lame_encoder::Bitrate::Kbps40,
        41..=48 => mp3lame_encoder::Bitrate::Kbps48,
        49..=64 => mp3lame_encoder::Bitrate::Kbps64,
        65..=80 => mp3lame_encoder::Bitrate::Kbps80,
        81..=96 => mp3lame_encoder::Bitrate::Kbps96,
        97..=112 => mp3lame_encoder::Bitrate::Kbps112,
        113..=128 => mp3lame_encoder::Bitrate::Kbps128,
        129..=160 => mp3lame_encoder::Bitrate::Kbps160,
        161..=192 => mp3lame_encoder::Bitrate::Kbps192,
        193..=224 => mp3lame_encoder::Bitrate::Kbps224,
        225..=256 => mp3lame_encoder::Bitrate::Kbps256,
        257..=320 => mp3lame_encoder::Bitrate::Kbps320,
        _ => mp3lame_encoder::Bitrate::Kbps320,
    }
}
