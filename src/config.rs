//! Pipeline options
//!
//! Options travel with each pipeline instance; nothing is process-wide.
//! They serialize as camelCase JSON and every field has a default, so a
//! config file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

pub use crate::audio_clean::gain::OverflowMode;

/// Video codec used for the final container
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum VideoCodec {
    /// Re-encode with H.264
    #[default]
    Libx264,
    /// Copy the source video stream bit-for-bit
    Copy,
}

impl VideoCodec {
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            VideoCodec::Libx264 => "libx264",
            VideoCodec::Copy => "copy",
        }
    }
}

/// How audio/video length mismatches are reconciled at remux
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DurationPolicy {
    /// Pad audio with silence and stop at the end of the video
    #[default]
    MatchVideo,
    /// Stop at the end of the shorter stream
    Shortest,
    /// Keep both streams at their full length
    Keep,
}

/// Spectral noise reduction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DenoiseOptions {
    pub enabled: bool,
    /// FFT size (power of two, >= 256)
    pub fft_size: usize,
    /// Noise over-subtraction in dB (0-24)
    pub noise_reduction_db: f32,
    /// Fraction of the attenuation actually applied (0-1)
    pub prop_decrease: f32,
    /// Minimum per-bin gain
    pub gain_floor: f32,
    /// Fraction of lowest-energy frames used for the noise profile
    pub quiet_frame_fraction: f32,
    /// Width of the median smoothing applied to the noise profile
    pub profile_smoothing_hz: f32,
    /// Time constant for per-bin gain smoothing
    pub time_smoothing_ms: f32,
}

impl Default for DenoiseOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            fft_size: 2048,
            noise_reduction_db: 12.0,
            prop_decrease: 1.0,
            gain_floor: 0.02,
            quiet_frame_fraction: 0.1,
            profile_smoothing_hz: 250.0,
            time_smoothing_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineOptions {
    /// Scalar applied to the denoised audio before remux
    pub gain: f32,
    /// 16-bit conversion behavior for denoise and gain output
    pub overflow: OverflowMode,
    /// Bitrate for the MP3 intermediates and the final AAC track
    pub audio_bitrate_kbps: u32,
    pub video_codec: VideoCodec,
    pub duration_policy: DurationPolicy,
    /// ffmpeg executable name or path
    pub ffmpeg_binary: String,
    pub denoise: DenoiseOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            gain: 1.0,
            overflow: OverflowMode::Clip,
            audio_bitrate_kbps: 192,
            video_codec: VideoCodec::Libx264,
            duration_policy: DurationPolicy::MatchVideo,
            ffmpeg_binary: "ffmpeg".to_string(),
            denoise: DenoiseOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Load options from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let options: Self = serde_json::from_str(&content)?;
        options.validate()?;
        log::info!("Loaded pipeline options from {}", path.display());
        Ok(options)
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| PipelineError::io(path, e))
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(invalid(format!("gain must be finite and >= 0, got {}", self.gain)));
        }
        if self.audio_bitrate_kbps == 0 {
            return Err(invalid("audioBitrateKbps must be > 0".to_string()));
        }
        if self.ffmpeg_binary.trim().is_empty() {
            return Err(invalid("ffmpegBinary must not be empty".to_string()));
        }

        let d = &self.denoise;
        if d.fft_size < 256 || !d.fft_size.is_power_of_two() {
            return Err(invalid(format!(
                "denoise.fftSize must be a power of two >= 256, got {}",
                d.fft_size
            )));
        }
        if !(0.0..=24.0).contains(&d.noise_reduction_db) {
            return Err(invalid(format!(
                "denoise.noiseReductionDb must be within 0-24, got {}",
                d.noise_reduction_db
            )));
        }
        if !(0.0..=1.0).contains(&d.prop_decrease) {
            return Err(invalid(format!(
                "denoise.propDecrease must be within 0-1, got {}",
                d.prop_decrease
            )));
        }
        if !(0.0..=1.0).contains(&d.gain_floor) {
            return Err(invalid(format!(
                "denoise.gainFloor must be within 0-1, got {}",
                d.gain_floor
            )));
        }
        if !(d.quiet_frame_fraction > 0.0 && d.quiet_frame_fraction <= 1.0) {
            return Err(invalid(format!(
                "denoise.quietFrameFraction must be within (0, 1], got {}",
                d.quiet_frame_fraction
            )));
        }
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;
        if !non_negative(d.profile_smoothing_hz) || !non_negative(d.time_smoothing_ms) {
            return Err(invalid("denoise smoothing widths must be >= 0".to_string()));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> PipelineError {
    PipelineError::InvalidConfig(msg)
}
