//! Video remux through an ffmpeg subprocess
//!
//! The processed audio is streamed to ffmpeg's stdin as raw s16le PCM, so no
//! extra intermediate file is written. A scoped thread feeds stdin while the
//! calling thread collects stderr, and both are joined before returning.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use super::Pcm16;
use crate::config::{DurationPolicy, VideoCodec};
use crate::error::{PipelineError, PipelineResult};

/// Everything needed to put a new audio track on a video
#[derive(Debug, Clone)]
pub struct RemuxJob<'a> {
    pub video: &'a Path,
    pub audio: &'a Pcm16,
    pub output: &'a Path,
    pub video_codec: VideoCodec,
    pub duration_policy: DurationPolicy,
    pub audio_bitrate_kbps: u32,
}

pub fn check_ffmpeg_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// ffmpeg arguments for a remux job. Input 0 is the video, input 1 is stdin.
pub fn remux_args(job: &RemuxJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(job.video.as_os_str().to_owned());

    let audio_rate = job.audio.sample_rate.to_string();
    let audio_channels = job.audio.channels.to_string();
    args.extend(
        [
            "-f",
            "s16le",
            "-ar",
            audio_rate.as_str(),
            "-ac",
            audio_channels.as_str(),
            "-i",
            "pipe:0",
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            job.video_codec.ffmpeg_name(),
        ]
        .iter()
        .map(OsString::from),
    );

    if job.video_codec == VideoCodec::Libx264 {
        args.extend(["-pix_fmt", "yuv420p"].iter().map(OsString::from));
    }

    match job.duration_policy {
        DurationPolicy::MatchVideo => {
            args.extend(["-af", "apad", "-shortest"].iter().map(OsString::from))
        }
        DurationPolicy::Shortest => args.push(OsString::from("-shortest")),
        DurationPolicy::Keep => {}
    }

    let audio_bitrate = format!("{}k", job.audio_bitrate_kbps);
    args.extend(["-c:a", "aac", "-b:a", audio_bitrate.as_str()].iter().map(OsString::from));
    args.push(job.output.as_os_str().to_owned());
    args
}

/// Run ffmpeg to write `job.output` from the source video and the given audio.
pub fn remux_audio(ffmpeg: &str, job: &RemuxJob) -> PipelineResult<()> {
    job.audio.validate()?;

    let args = remux_args(job);
    log::debug!("Running {} {:?}", ffmpeg, args);

    let mut child = Command::new(ffmpeg)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PipelineError::FfmpegUnavailable(e.to_string()))?;

    let stdin = match child.stdin.take() {
        Some(stdin) => stdin,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PipelineError::Ffmpeg("Failed to capture ffmpeg stdin".to_string()));
        }
    };

    let pcm_bytes: Vec<u8> = job
        .audio
        .samples
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();

    let (write_result, output) = std::thread::scope(|scope| {
        let writer = scope.spawn(move || {
            let mut stdin = stdin;
            stdin.write_all(&pcm_bytes)
            // stdin drops here, signalling EOF
        });
        let output = child.wait_with_output();
        (writer.join(), output)
    });

    let output =
        output.map_err(|e| PipelineError::Ffmpeg(format!("ffmpeg process error: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Ffmpeg(format!(
            "exited with code {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    match write_result {
        Ok(Ok(())) => {}
        // ffmpeg may stop reading once the video ends
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            log::debug!("ffmpeg closed stdin early: audio longer than video");
        }
        Ok(Err(e)) => return Err(PipelineError::io(job.output, e)),
        Err(_) => {
            return Err(PipelineError::TaskFailed(
                "ffmpeg stdin writer panicked".to_string(),
            ))
        }
    }

    log::info!(
        "Remuxed {} with {:.2}s of audio into {}",
        job.video.display(),
        job.audio.duration_secs(),
        job.output.display()
    );

    Ok(())
}
