//! Video audio pipeline orchestration
//!
//! Runs the four stages in order: extract, transcode, denoise, gain and remux.
//! Every stage reads the previous stage's file from the output directory, so
//! each one can also be run on its own.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::audio_clean::channels::downmix_to_mono;
use crate::audio_clean::gain::{apply_gain, normalized_to_pcm16, pcm16_to_f32};
use crate::audio_clean::reduce_noise;
use crate::config::PipelineOptions;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::media::decode::decode_audio_file;
use crate::media::ffmpeg::{remux_audio, RemuxJob};
use crate::media::mp3::encode_mp3;
use crate::media::wav::{read_pcm16, write_pcm16};
use crate::media::Pcm16;

pub const COMPRESSED_AUDIO_NAME: &str = "audio.mp3";
pub const UNCOMPRESSED_AUDIO_NAME: &str = "temp.wav";
pub const DENOISED_UNCOMPRESSED_NAME: &str = "filtered_audio.wav";
pub const DENOISED_COMPRESSED_NAME: &str = "filtered_audio.mp3";
pub const OUTPUT_VIDEO_NAME: &str = "video_final.mp4";

/// Fixed file locations inside one output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub compressed_audio: PathBuf,
    pub uncompressed_audio: PathBuf,
    pub denoised_uncompressed_audio: PathBuf,
    pub denoised_compressed_audio: PathBuf,
    pub output_video: PathBuf,
}

impl PipelinePaths {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            compressed_audio: output_dir.join(COMPRESSED_AUDIO_NAME),
            uncompressed_audio: output_dir.join(UNCOMPRESSED_AUDIO_NAME),
            denoised_uncompressed_audio: output_dir.join(DENOISED_UNCOMPRESSED_NAME),
            denoised_compressed_audio: output_dir.join(DENOISED_COMPRESSED_NAME),
            output_video: output_dir.join(OUTPUT_VIDEO_NAME),
        }
    }

    /// All five paths in the order the stages write them
    pub fn all(&self) -> [&Path; 5] {
        [
            &self.compressed_audio,
            &self.uncompressed_audio,
            &self.denoised_uncompressed_audio,
            &self.denoised_compressed_audio,
            &self.output_video,
        ]
    }
}

/// One pipeline instance: a source video, an output directory and its options
#[derive(Debug, Clone)]
pub struct MediaAudioPipeline {
    video_path: PathBuf,
    audio_path: Option<PathBuf>,
    output_dir: PathBuf,
    paths: PipelinePaths,
    options: PipelineOptions,
}

impl MediaAudioPipeline {
    /// No path is checked here; `run` reports a missing source.
    pub fn new(
        video_path: impl Into<PathBuf>,
        audio_path: Option<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let output_dir = output_dir.into();
        Self {
            video_path: video_path.into(),
            audio_path,
            paths: PipelinePaths::new(&output_dir),
            output_dir,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Secondary audio path. Stored, never read by any stage.
    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every stage and return the path of the final video.
    pub fn run(&self) -> PipelineResult<PathBuf> {
        self.options.validate()?;

        if !self.video_path.is_file() {
            return Err(PipelineError::SourceNotFound(self.video_path.clone()));
        }

        if let Some(audio) = &self.audio_path {
            log::debug!("Secondary audio path {} is not used", audio.display());
        }

        log::info!(
            "Processing {} into {}",
            self.video_path.display(),
            self.output_dir.display()
        );
        let start = Instant::now();

        self.run_stage(Stage::Extract, || self.extract_audio())?;
        self.run_stage(Stage::Transcode, || self.transcode_to_uncompressed())?;
        self.run_stage(Stage::Denoise, || self.denoise())?;
        self.run_stage(Stage::Remux, || self.gain_and_remux())?;

        log::info!(
            "Pipeline finished in {:.2}s: {}",
            start.elapsed().as_secs_f64(),
            self.paths.output_video.display()
        );

        Ok(self.paths.output_video.clone())
    }

    fn run_stage<F>(&self, stage: Stage, f: F) -> PipelineResult<()>
    where
        F: FnOnce() -> PipelineResult<()>,
    {
        log::info!("Stage '{}' started", stage);
        let start = Instant::now();

        match f() {
            Ok(()) => {
                log::info!(
                    "Stage '{}' done in {:.2}s",
                    stage,
                    start.elapsed().as_secs_f64()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("Stage '{}' failed: {}", stage, e);
                Err(PipelineError::Stage {
                    stage,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Demux the source's audio track into `audio.mp3`.
    pub fn extract_audio(&self) -> PipelineResult<()> {
        let decoded = decode_audio_file(&self.video_path)?;
        log::info!(
            "Source audio: {} Hz, {} ch, {:.2}s",
            decoded.sample_rate,
            decoded.channels,
            decoded.duration_secs()
        );

        encode_mp3(
            &self.paths.compressed_audio,
            &decoded.to_pcm16(),
            self.options.audio_bitrate_kbps,
        )
    }

    /// Decode `audio.mp3` into `temp.wav`.
    pub fn transcode_to_uncompressed(&self) -> PipelineResult<()> {
        let decoded = decode_audio_file(&self.paths.compressed_audio)?;
        write_pcm16(&self.paths.uncompressed_audio, &decoded.to_pcm16())
    }

    /// Collapse `temp.wav` to mono, reduce noise, and write both filtered files.
    pub fn denoise(&self) -> PipelineResult<()> {
        let pcm = read_pcm16(&self.paths.uncompressed_audio)?;
        pcm.validate()?;

        let normalized = pcm16_to_f32(&pcm.samples);
        let mut mono = if pcm.channels >= 2 {
            log::debug!("Averaging {} channels to mono", pcm.channels);
            downmix_to_mono(&normalized, pcm.channels as usize)
        } else {
            normalized
        };

        reduce_noise(&mut mono, pcm.sample_rate, &self.options.denoise)?;

        let samples = normalized_to_pcm16(&mono, self.options.overflow);
        let filtered = Pcm16::new(samples, pcm.sample_rate, 1);
        write_pcm16(&self.paths.denoised_uncompressed_audio, &filtered)?;

        let reread = read_pcm16(&self.paths.denoised_uncompressed_audio)?;
        encode_mp3(
            &self.paths.denoised_compressed_audio,
            &reread,
            self.options.audio_bitrate_kbps,
        )
    }

    /// Apply gain to `filtered_audio.mp3` and mux it with the source video.
    pub fn gain_and_remux(&self) -> PipelineResult<()> {
        let decoded = decode_audio_file(&self.paths.denoised_compressed_audio)?;
        let pcm = decoded.to_pcm16();
        let gained = Pcm16::new(
            apply_gain(&pcm.samples, self.options.gain, self.options.overflow),
            pcm.sample_rate,
            pcm.channels,
        );
        log::debug!("Applied gain {}x ({:?})", self.options.gain, self.options.overflow);

        let job = RemuxJob {
            video: &self.video_path,
            audio: &gained,
            output: &self.paths.output_video,
            video_codec: self.options.video_codec,
            duration_policy: self.options.duration_policy,
            audio_bitrate_kbps: self.options.audio_bitrate_kbps,
        };
        remux_audio(&self.options.ffmpeg_binary, &job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OverflowMode, VideoCodec};
    use crate::media::ffmpeg::check_ffmpeg_available;
    use realfft::RealFftPlanner;
    use std::process::Command;

    const SAMPLE_RATE: u32 = 44100;

    /// Deterministic LCG noise in [-1, 1)
    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
            })
            .collect()
    }

    fn noisy_tone_pcm(channels: u16, secs: f32) -> Pcm16 {
        let frames = (secs * SAMPLE_RATE as f32) as usize;
        let hiss = noise(frames, 7);
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for (i, n) in hiss.iter().enumerate() {
            let t = i as f32 / SAMPLE_RATE as f32;
            let s = 0.3 * (2.0 * std::f32::consts::PI * 1000.0 * t).sin() + 0.05 * n;
            for _ in 0..channels {
                samples.push((s * 32767.0) as i16);
            }
        }
        Pcm16::new(samples, SAMPLE_RATE, channels)
    }

    fn ffmpeg_available() -> bool {
        let ok = check_ffmpeg_available("ffmpeg");
        if !ok {
            eprintln!("ffmpeg not found, skipping");
        }
        ok
    }

    fn ffmpeg(args: &[&str]) {
        let status = Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "ffmpeg {:?} failed", args);
    }

    /// Energy in a band around `tone_hz` relative to the rest of 100 Hz-10 kHz, in dB
    fn tone_to_noise_db(samples: &[f32], sample_rate: u32, tone_hz: f32) -> f32 {
        let n = samples.len();
        let windowed: Vec<f32> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let w = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos();
                s * w
            })
            .collect();

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let mut input = windowed;
        let mut spectrum = fft.make_output_vec();
        fft.process(&mut input, &mut spectrum).unwrap();

        let bin_hz = sample_rate as f32 / n as f32;
        let (mut tone, mut rest) = (0.0f64, 0.0f64);
        for (k, c) in spectrum.iter().enumerate() {
            let freq = k as f32 * bin_hz;
            let power = c.norm_sqr() as f64;
            if (freq - tone_hz).abs() <= 30.0 {
                tone += power;
            } else if (100.0..=10_000.0).contains(&freq) {
                rest += power;
            }
        }
        10.0 * (tone / rest.max(1e-20)).log10() as f32
    }

    fn mono_of(path: &Path) -> (Vec<f32>, u32, f64) {
        let decoded = decode_audio_file(path).unwrap();
        let mono = downmix_to_mono(&decoded.samples, decoded.channels as usize);
        (mono, decoded.sample_rate, decoded.duration_secs())
    }

    #[test]
    fn test_paths_are_fixed_names_in_output_dir() {
        let pipeline = MediaAudioPipeline::new("in.mp4", None, "/tmp/job");
        let paths = pipeline.paths();
        assert_eq!(paths.compressed_audio, PathBuf::from("/tmp/job/audio.mp3"));
        assert_eq!(paths.uncompressed_audio, PathBuf::from("/tmp/job/temp.wav"));
        assert_eq!(
            paths.denoised_uncompressed_audio,
            PathBuf::from("/tmp/job/filtered_audio.wav")
        );
        assert_eq!(
            paths.denoised_compressed_audio,
            PathBuf::from("/tmp/job/filtered_audio.mp3")
        );
        assert_eq!(paths.output_video, PathBuf::from("/tmp/job/video_final.mp4"));
        assert_eq!(paths.all().len(), 5);
        assert!(pipeline.audio_path().is_none());
    }

    #[test]
    fn test_secondary_audio_is_stored() {
        let pipeline =
            MediaAudioPipeline::new("in.mp4", Some(PathBuf::from("voice.wav")), "out");
        assert_eq!(pipeline.audio_path(), Some(Path::new("voice.wav")));
    }

    #[test]
    fn test_missing_source_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MediaAudioPipeline::new(dir.path().join("missing.mp4"), None, dir.path());

        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_options_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            gain: -2.0,
            ..Default::default()
        };
        let err = MediaAudioPipeline::new(dir.path().join("missing.mp4"), None, dir.path())
            .with_options(options)
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn test_transcode_writes_wav_from_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MediaAudioPipeline::new("unused.mp4", None, dir.path());
        encode_mp3(
            &pipeline.paths().compressed_audio,
            &noisy_tone_pcm(2, 1.0),
            192,
        )
        .unwrap();

        pipeline.transcode_to_uncompressed().unwrap();

        let wav = read_pcm16(&pipeline.paths().uncompressed_audio).unwrap();
        assert_eq!(wav.channels, 2);
        assert_eq!(wav.sample_rate, SAMPLE_RATE);
        assert!((wav.duration_secs() - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_denoise_collapses_stereo_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MediaAudioPipeline::new("unused.mp4", None, dir.path());
        let source = noisy_tone_pcm(2, 1.0);
        write_pcm16(&pipeline.paths().uncompressed_audio, &source).unwrap();

        pipeline.denoise().unwrap();

        let filtered = read_pcm16(&pipeline.paths().denoised_uncompressed_audio).unwrap();
        assert_eq!(filtered.channels, 1);
        assert_eq!(filtered.sample_rate, SAMPLE_RATE);
        assert_eq!(filtered.frames(), source.frames());
        assert!(pipeline.paths().denoised_compressed_audio.is_file());
    }

    #[test]
    fn test_denoise_disabled_passes_mono_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = PipelineOptions::default();
        options.denoise.enabled = false;
        let pipeline =
            MediaAudioPipeline::new("unused.mp4", None, dir.path()).with_options(options);
        let source = noisy_tone_pcm(1, 0.5);
        write_pcm16(&pipeline.paths().uncompressed_audio, &source).unwrap();

        pipeline.denoise().unwrap();

        let filtered = read_pcm16(&pipeline.paths().denoised_uncompressed_audio).unwrap();
        assert_eq!(filtered, source);
    }

    #[test]
    fn test_denoise_rejects_empty_wav() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MediaAudioPipeline::new("unused.mp4", None, dir.path());
        write_pcm16(
            &pipeline.paths().uncompressed_audio,
            &Pcm16::new(vec![], SAMPLE_RATE, 1),
        )
        .unwrap();

        let err = pipeline.denoise().unwrap_err();
        assert!(matches!(err, PipelineError::EmptyAudio(_)));
        assert!(!pipeline.paths().denoised_uncompressed_audio.exists());
    }

    #[test]
    fn test_denoise_wrap_mode_keeps_in_range_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = PipelineOptions {
            overflow: OverflowMode::Wrap,
            ..Default::default()
        };
        options.denoise.enabled = false;
        let pipeline =
            MediaAudioPipeline::new("unused.mp4", None, dir.path()).with_options(options);
        let mut samples = noisy_tone_pcm(1, 0.25).samples;
        samples[..4].copy_from_slice(&[i16::MAX, i16::MIN, -1, 1]);
        let source = Pcm16::new(samples, SAMPLE_RATE, 1);
        write_pcm16(&pipeline.paths().uncompressed_audio, &source).unwrap();

        pipeline.denoise().unwrap();

        let filtered = read_pcm16(&pipeline.paths().denoised_uncompressed_audio).unwrap();
        assert_eq!(filtered, source);
    }

    #[test]
    fn test_stage_chain_keeps_audio_timing() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = PipelineOptions::default();
        options.denoise.enabled = false;
        let pipeline =
            MediaAudioPipeline::new("unused.mp4", None, dir.path()).with_options(options);

        // 2 s of silence with one click at 1 s, as extract_audio would leave it
        let mut samples = vec![0i16; 2 * SAMPLE_RATE as usize];
        samples[SAMPLE_RATE as usize] = 30000;
        encode_mp3(
            &pipeline.paths().compressed_audio,
            &Pcm16::new(samples, SAMPLE_RATE, 1),
            192,
        )
        .unwrap();

        pipeline.transcode_to_uncompressed().unwrap();
        pipeline.denoise().unwrap();

        // What gain_and_remux hands to ffmpeg
        let decoded = decode_audio_file(&pipeline.paths().denoised_compressed_audio).unwrap();
        let (mono, _, _) = mono_of(&pipeline.paths().denoised_compressed_audio);
        let click = mono
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();

        assert!(
            (click as i64 - SAMPLE_RATE as i64).abs() <= 8,
            "Click moved from {} to {}",
            SAMPLE_RATE,
            click
        );
        assert_eq!(decoded.frames(), 2 * SAMPLE_RATE as usize);
    }

    #[test]
    fn test_video_without_audio_fails_at_extract() {
        if !ffmpeg_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("silent.mp4");
        ffmpeg(&[
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=1:size=160x120:rate=25",
            "-an",
            "-c:v",
            "mpeg4",
            video.to_str().unwrap(),
        ]);

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let pipeline = MediaAudioPipeline::new(&video, None, &out);

        let err = pipeline.run().unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Extract));
        assert!(!pipeline.paths().compressed_audio.exists());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    fn ffprobe_available() -> bool {
        let ok = check_ffmpeg_available("ffprobe");
        if !ok {
            eprintln!("ffprobe not found, skipping");
        }
        ok
    }

    fn has_encoder(name: &str) -> bool {
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
            .unwrap();
        let listed = String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(name));
        if !listed {
            eprintln!("ffmpeg has no {} encoder, skipping", name);
        }
        listed
    }

    #[derive(Debug)]
    struct VideoStream {
        codec: String,
        pix_fmt: String,
        packets: u64,
        duration: f64,
    }

    fn probe_video_stream(path: &Path) -> VideoStream {
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-select_streams", "v:0", "-count_packets"])
            .args([
                "-show_entries",
                "stream=codec_name,pix_fmt,nb_read_packets,duration",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(path)
            .output()
            .unwrap();
        assert!(output.status.success(), "ffprobe failed on {}", path.display());

        let mut stream = VideoStream {
            codec: String::new(),
            pix_fmt: String::new(),
            packets: 0,
            duration: 0.0,
        };
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            match line.split_once('=') {
                Some(("codec_name", v)) => stream.codec = v.trim().to_string(),
                Some(("pix_fmt", v)) => stream.pix_fmt = v.trim().to_string(),
                Some(("nb_read_packets", v)) => stream.packets = v.trim().parse().unwrap(),
                Some(("duration", v)) => stream.duration = v.trim().parse().unwrap_or(0.0),
                _ => {}
            }
        }
        stream
    }

    /// Per-packet MD5s of the first video stream
    fn video_packet_hashes(path: &Path) -> Vec<String> {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-c", "copy", "-f", "framemd5", "-"])
            .output()
            .unwrap();
        assert!(output.status.success(), "framemd5 failed on {}", path.display());

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
            .filter_map(|line| line.rsplit(',').next().map(|h| h.trim().to_string()))
            .collect()
    }

    /// 5 s test pattern with a 1 kHz tone under white noise
    fn make_noisy_video(dir: &Path) -> PathBuf {
        let video = dir.join("noisy.mp4");
        ffmpeg(&[
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=5:size=160x120:rate=25",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=1000:sample_rate=44100:duration=5",
            "-f",
            "lavfi",
            "-i",
            "anoisesrc=sample_rate=44100:amplitude=0.1:duration=5",
            "-filter_complex",
            "[1:a][2:a]amix=inputs=2:duration=first[a]",
            "-map",
            "0:v",
            "-map",
            "[a]",
            "-c:v",
            "mpeg4",
            "-c:a",
            "aac",
            video.to_str().unwrap(),
        ]);
        video
    }

    fn run_end_to_end(dir: &Path, video: &Path, options: PipelineOptions) -> PathBuf {
        let out = dir.join("out");
        std::fs::create_dir(&out).unwrap();
        let pipeline = MediaAudioPipeline::new(video, None, &out).with_options(options);

        let output = pipeline.run().unwrap();
        assert_eq!(output, out.join(OUTPUT_VIDEO_NAME));
        for path in pipeline.paths().all() {
            assert!(path.is_file(), "{} missing", path.display());
        }

        let (_, _, audio_duration) = mono_of(&output);
        assert!(
            (audio_duration - 5.0).abs() <= 0.25,
            "Expected ~5s of audio, got {:.3}s",
            audio_duration
        );
        output
    }

    #[test]
    fn test_end_to_end_copy_keeps_video_and_reduces_noise() {
        if !ffmpeg_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let video = make_noisy_video(dir.path());
        let options = PipelineOptions {
            video_codec: VideoCodec::Copy,
            ..Default::default()
        };
        let output = run_end_to_end(dir.path(), &video, options);

        let source_packets = video_packet_hashes(&video);
        assert_eq!(source_packets.len(), 125);
        assert_eq!(video_packet_hashes(&output), source_packets);

        let (before, rate_before, _) = mono_of(&video);
        let (after, rate_after, _) = mono_of(&output);
        let snr_before = tone_to_noise_db(&before, rate_before, 1000.0);
        let snr_after = tone_to_noise_db(&after, rate_after, 1000.0);
        assert!(
            snr_after - snr_before >= 6.0,
            "Tone-to-noise went from {:.1} dB to {:.1} dB",
            snr_before,
            snr_after
        );
    }

    #[test]
    fn test_end_to_end_default_codec_reencodes_video() {
        if !ffmpeg_available() || !ffprobe_available() || !has_encoder("libx264") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let video = make_noisy_video(dir.path());
        let output = run_end_to_end(dir.path(), &video, PipelineOptions::default());

        let source = probe_video_stream(&video);
        let result = probe_video_stream(&output);
        assert_eq!(result.codec, "h264");
        assert_eq!(result.pix_fmt, "yuv420p");
        assert_eq!(result.packets, source.packets);
        assert!(
            (result.duration - source.duration).abs() <= 0.1,
            "Video duration {:.3}s vs source {:.3}s",
            result.duration,
            source.duration
        );
    }
}
