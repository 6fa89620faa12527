use std::fmt;
use std::path::PathBuf;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transcode,
    Denoise,
    Remux,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract audio",
            Stage::Transcode => "transcode to WAV",
            Stage::Denoise => "denoise",
            Stage::Remux => "gain and remux",
        };
        f.write_str(name)
    }
}

/// Typed pipeline errors. Every failure surfaces to the caller of `run`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to probe format: {0}")]
    Probe(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("No audio tracks found in {}", .0.display())]
    NoAudioTrack(PathBuf),
    #[error("Empty audio: {0}")]
    EmptyAudio(String),
    #[error("Malformed audio: {0}")]
    MalformedAudio(String),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("MP3 encode error: {0}")]
    Encode(String),
    #[error("DSP error: {0}")]
    Dsp(String),
    #[error("Failed to run ffmpeg (is it installed?): {0}")]
    FfmpegUnavailable(String),
    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// The stage that failed, if the error was raised inside one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, with stage wrappers removed.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
