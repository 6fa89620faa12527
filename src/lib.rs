//! Video audio scrubbing
//!
//! Takes a video, pulls out its audio track, reduces background noise,
//! applies a gain, and writes a new video with the cleaned track:
//!
//! ```text
//! video -> audio.mp3 -> temp.wav -> filtered_audio.wav/.mp3 -> video_final.mp4
//! ```
//!
//! All intermediates live in the output directory given to each run.

pub mod audio_clean;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod services;

pub use config::{DenoiseOptions, DurationPolicy, OverflowMode, PipelineOptions, VideoCodec};
pub use error::{PipelineError, PipelineResult, Stage};
pub use pipeline::{MediaAudioPipeline, PipelinePaths, OUTPUT_VIDEO_NAME};
