use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use video_scrub::services::jobs::run_pipeline;
use video_scrub::{PipelineOptions, VideoCodec};

/// Denoise a video's audio track and remux it
#[derive(Parser, Debug)]
#[clap(name = "video-scrub")]
#[clap(about = "Extract, denoise and amplify a video's audio, then write video_final.mp4")]
struct Args {
    /// Source video
    video: PathBuf,

    /// Directory for intermediates and the final video (created if absent)
    output_dir: PathBuf,

    /// Secondary audio file (accepted, not used)
    #[clap(long, value_name = "PATH")]
    audio: Option<PathBuf>,

    /// JSON options file
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Gain applied before remux (overrides the config file)
    #[clap(long)]
    gain: Option<f32>,

    /// Video codec for the output container
    #[clap(long, value_enum)]
    video_codec: Option<CodecArg>,

    /// Skip noise reduction
    #[clap(long)]
    no_denoise: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CodecArg {
    Libx264,
    Copy,
}

impl From<CodecArg> for VideoCodec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Libx264 => VideoCodec::Libx264,
            CodecArg::Copy => VideoCodec::Copy,
        }
    }
}

fn build_options(args: &Args) -> video_scrub::PipelineResult<PipelineOptions> {
    let mut options = match &args.config {
        Some(path) => PipelineOptions::load(path)?,
        None => PipelineOptions::default(),
    };
    if let Some(gain) = args.gain {
        options.gain = gain;
    }
    if let Some(codec) = args.video_codec {
        options.video_codec = codec.into();
    }
    if args.no_denoise {
        options.denoise.enabled = false;
    }
    options.validate()?;
    Ok(options)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();

    let options = match build_options(&args) {
        Ok(options) => options,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    match run_pipeline(args.video, args.audio, args.output_dir, options).await {
        Ok(output) => println!("{}", output.display()),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
