//! Gain and 16-bit sample conversion

use serde::{Deserialize, Serialize};

/// How out-of-range values are mapped onto 16-bit PCM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum OverflowMode {
    /// Saturate to [-32768, 32767]
    #[default]
    Clip,
    /// Two's-complement wrap, matching a raw integer cast
    Wrap,
}

/// Convert a value in 16-bit integer scale to `i16`.
///
/// Values are rounded to the nearest integer first. NaN maps to 0.
pub fn to_pcm16(value: f32, mode: OverflowMode) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let rounded = value.round();
    match mode {
        OverflowMode::Clip => rounded.clamp(i16::MIN as f32, i16::MAX as f32) as i16,
        // f32 -> i64 saturates only far outside the i16 range, then truncation wraps
        OverflowMode::Wrap => (rounded as i64) as i16,
    }
}

/// Multiply every sample by `factor`.
pub fn apply_gain(samples: &[i16], factor: f32, mode: OverflowMode) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| to_pcm16(s as f32 * factor, mode))
        .collect()
}

/// Convert normalized [-1, 1] samples to 16-bit, saturating.
///
/// Inverse of [`pcm16_to_f32`], so decoded 16-bit sources round-trip exactly.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<i16> {
    normalized_to_pcm16(samples, OverflowMode::Clip)
}

/// Convert normalized samples to 16-bit with the given overflow handling.
///
/// Scaling is by 32768, so with `Wrap` a sample at exactly 1.0 lands on
/// +32768 and wraps to -32768.
pub fn normalized_to_pcm16(samples: &[f32], mode: OverflowMode) -> Vec<i16> {
    samples.iter().map(|&s| to_pcm16(s * 32768.0, mode)).collect()
}

/// Convert 16-bit samples to normalized f32.
pub fn pcm16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}
