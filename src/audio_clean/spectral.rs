//! Spectral noise suppression using FFT-based Wiener filtering
//!
//! No separate noise clip is needed: the noise profile is inferred from the
//! quietest frames of the signal itself, then median-smoothed across frequency
//! so narrow tonal peaks are not mistaken for noise.

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::config::DenoiseOptions;
use crate::error::{PipelineError, PipelineResult};

/// FFT-based spectral denoiser
pub struct SpectralDenoiser {
    fft_size: usize,
    hop_size: usize,
    sample_rate: f32,
    noise_profile: Vec<f32>,
    reduction_db: f32,
    prop_decrease: f32,
    gain_floor: f32,
    quiet_frame_fraction: f32,
    profile_smoothing_hz: f32,
    time_smoothing_ms: f32,
    forward_fft: Arc<dyn RealToComplex<f32>>,
    inverse_fft: Arc<dyn ComplexToReal<f32>>,
    window: Vec<f32>,
}

impl SpectralDenoiser {
    /// Create a new spectral denoiser for audio at `sample_rate` Hz
    pub fn new(sample_rate: u32, options: &DenoiseOptions) -> Self {
        let fft_size = options.fft_size;
        let hop_size = fft_size / 4; // 75% overlap

        let mut planner = RealFftPlanner::<f32>::new();
        let forward_fft = planner.plan_fft_forward(fft_size);
        let inverse_fft = planner.plan_fft_inverse(fft_size);

        // Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / fft_size as f32).cos())
            })
            .collect();

        Self {
            fft_size,
            hop_size,
            sample_rate: sample_rate as f32,
            noise_profile: vec![0.0; fft_size / 2 + 1],
            reduction_db: options.noise_reduction_db,
            prop_decrease: options.prop_decrease.clamp(0.0, 1.0),
            gain_floor: options.gain_floor.clamp(0.0, 1.0),
            quiet_frame_fraction: options.quiet_frame_fraction,
            profile_smoothing_hz: options.profile_smoothing_hz,
            time_smoothing_ms: options.time_smoothing_ms,
            forward_fft,
            inverse_fft,
            window,
        }
    }

    pub fn noise_profile(&self) -> &[f32] {
        &self.noise_profile
    }

    fn bin_hz(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    /// Window `frame` and write its spectrum into `spectrum`
    fn analyze(
        &self,
        frame: &[f32],
        buffer: &mut [f32],
        spectrum: &mut [Complex<f32>],
    ) -> PipelineResult<()> {
        for ((dst, s), w) in buffer.iter_mut().zip(frame).zip(&self.window) {
            *dst = s * w;
        }
        self.forward_fft
            .process(buffer, spectrum)
            .map_err(|e| PipelineError::Dsp(format!("Forward FFT failed: {}", e)))
    }

    /// Estimate the noise profile from the lowest-energy frames of `samples`
    pub fn estimate_noise_profile(&mut self, samples: &[f32]) -> PipelineResult<()> {
        let mut frame_energies: Vec<(usize, f32)> = Vec::new();

        let mut pos = 0;
        while pos + self.fft_size <= samples.len() {
            let frame = &samples[pos..pos + self.fft_size];
            let energy: f32 = frame.iter().map(|s| s * s).sum();
            frame_energies.push((pos, energy));
            pos += self.hop_size;
        }

        if frame_energies.is_empty() {
            log::warn!(
                "Noise profile: {} samples is shorter than one {}-point frame",
                samples.len(),
                self.fft_size
            );
            return Ok(());
        }

        frame_energies.sort_by(|a, b| a.1.total_cmp(&b.1));
        let quiet_count = ((frame_energies.len() as f32 * self.quiet_frame_fraction).ceil()
            as usize)
            .clamp(1, frame_energies.len());

        let mut spectrum_sum = vec![0.0f32; self.fft_size / 2 + 1];
        let mut buffer = self.forward_fft.make_input_vec();
        let mut spectrum = self.forward_fft.make_output_vec();

        for &(start, _) in frame_energies.iter().take(quiet_count) {
            self.analyze(&samples[start..start + self.fft_size], &mut buffer, &mut spectrum)?;
            for (sum, c) in spectrum_sum.iter_mut().zip(&spectrum) {
                *sum += c.norm();
            }
        }

        for (profile, sum) in self.noise_profile.iter_mut().zip(&spectrum_sum) {
            *profile = sum / quiet_count as f32;
        }
        self.smooth_profile();

        log::debug!(
            "Noise profile from {} of {} frames, mean magnitude {:.5}",
            quiet_count,
            frame_energies.len(),
            self.noise_profile.iter().sum::<f32>() / self.noise_profile.len() as f32
        );

        Ok(())
    }

    /// Running median across `profile_smoothing_hz`
    fn smooth_profile(&mut self) {
        let half_width = (self.profile_smoothing_hz / self.bin_hz() / 2.0).round() as usize;
        if half_width == 0 {
            return;
        }

        let source = self.noise_profile.clone();
        let mut neighborhood: Vec<f32> = Vec::with_capacity(half_width * 2 + 1);
        for (i, profile) in self.noise_profile.iter_mut().enumerate() {
            let lo = i.saturating_sub(half_width);
            let hi = (i + half_width + 1).min(source.len());
            neighborhood.clear();
            neighborhood.extend_from_slice(&source[lo..hi]);
            neighborhood.sort_by(|a, b| a.total_cmp(b));
            *profile = neighborhood[neighborhood.len() / 2];
        }
    }

    /// One-pole coefficient for per-bin gain smoothing between hops
    fn time_smoothing_coeff(&self) -> f32 {
        if self.time_smoothing_ms <= 0.0 {
            return 0.0;
        }
        let hop_ms = self.hop_size as f32 / self.sample_rate * 1000.0;
        (-hop_ms / self.time_smoothing_ms).exp()
    }

    /// Process audio in place
    ///
    /// Applies Wiener filtering: gain = max(floor, 1 - noise/signal)
    pub fn process(&mut self, samples: &mut [f32]) -> PipelineResult<()> {
        if samples.len() < self.fft_size {
            log::warn!(
                "Skipping spectral denoise: {} samples is shorter than one frame",
                samples.len()
            );
            return Ok(());
        }

        let reduction_factor = 10.0_f32.powf(self.reduction_db / 20.0);
        let alpha = self.time_smoothing_coeff();
        let num_bins = self.fft_size / 2 + 1;

        // Reflect-pad by one frame on each side so every sample gets full overlap
        let pad = self.fft_size;
        let padded: Vec<f32> = (0..samples.len() + 2 * pad)
            .map(|i| samples[reflect_index(i as isize - pad as isize, samples.len())])
            .collect();

        let mut output = vec![0.0f32; padded.len()];
        let mut window_sum = vec![0.0f32; padded.len()];

        let mut buffer = self.forward_fft.make_input_vec();
        let mut spectrum = self.forward_fft.make_output_vec();
        let mut time_buffer = self.inverse_fft.make_output_vec();
        let mut smoothed_gain: Vec<f32> = Vec::new();
        let norm = 1.0 / self.fft_size as f32;

        let mut pos = 0;
        while pos + self.fft_size <= padded.len() {
            self.analyze(&padded[pos..pos + self.fft_size], &mut buffer, &mut spectrum)?;

            let first_frame = smoothed_gain.is_empty();
            if first_frame {
                smoothed_gain.resize(num_bins, 1.0);
            }

            for (i, c) in spectrum.iter_mut().enumerate() {
                let signal_mag = c.norm();
                let noise_mag = self.noise_profile[i] * reduction_factor;

                let wiener = if signal_mag > 0.0 {
                    (1.0 - noise_mag / signal_mag).max(self.gain_floor)
                } else {
                    self.gain_floor
                };
                let gain = 1.0 - self.prop_decrease * (1.0 - wiener);

                smoothed_gain[i] = if first_frame {
                    gain
                } else {
                    alpha * smoothed_gain[i] + (1.0 - alpha) * gain
                };

                *c *= smoothed_gain[i];
            }

            // DC and Nyquist must be purely real for the inverse transform
            spectrum[0].im = 0.0;
            spectrum[num_bins - 1].im = 0.0;

            self.inverse_fft
                .process(&mut spectrum, &mut time_buffer)
                .map_err(|e| PipelineError::Dsp(format!("Inverse FFT failed: {}", e)))?;

            for (i, sample) in time_buffer.iter().enumerate() {
                output[pos + i] += sample * norm * self.window[i];
                window_sum[pos + i] += self.window[i] * self.window[i];
            }

            pos += self.hop_size;
        }

        // Overlap-add normalization
        for (i, sample) in samples.iter_mut().enumerate() {
            let j = i + pad;
            if window_sum[j] > 1e-3 {
                *sample = output[j] / window_sum[j];
            }
        }

        Ok(())
    }
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge sample
fn reflect_index(i: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = i.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}
