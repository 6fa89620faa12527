//! Media I/O
//!
//! Decoding goes through symphonia, WAV through hound, MP3 encoding through
//! LAME, and the final video remux through an ffmpeg subprocess.

pub mod decode;
pub mod ffmpeg;
pub mod mp3;
pub mod wav;

use crate::error::{PipelineError, PipelineResult};

/// Interleaved signed 16-bit PCM
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm16 {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Pcm16 {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reject zero-length audio and buffers that do not divide into whole frames.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(PipelineError::MalformedAudio(format!(
                "{} channels at {} Hz",
                self.channels, self.sample_rate
            )));
        }
        if self.samples.is_empty() {
            return Err(PipelineError::EmptyAudio("zero samples".to_string()));
        }
        if self.samples.len() % self.channels as usize != 0 {
            return Err(PipelineError::MalformedAudio(format!(
                "{} samples do not divide into {} channels",
                self.samples.len(),
                self.channels
            )));
        }
        Ok(())
    }
}
