//! Channel layout helpers

/// Average interleaved frames down to one channel.
///
/// Mono input is returned as-is. A trailing partial frame is dropped.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// 16-bit variant of [`downmix_to_mono`]; the mean is computed in f32 and rounded.
pub fn downmix_pcm16_to_mono(interleaved: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| s as f32).sum();
            (sum / channels as f32).round() as i16
        })
        .collect()
}

/// Duplicate each mono sample into an interleaved stereo pair.
pub fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    mono.iter().flat_map(|&s| [s, s]).collect()
}
