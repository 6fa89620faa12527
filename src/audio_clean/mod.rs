//! Audio cleaning module
//!
//! Sample-level processing used by the denoise and gain stages:
//! 1. Channel collapse (stereo to mono by averaging)
//! 2. Spectral noise suppression (FFT-based Wiener filter)
//! 3. Scalar gain with explicit 16-bit overflow handling

pub mod channels;
pub mod gain;
pub mod spectral;

pub use gain::{apply_gain, OverflowMode};
pub use spectral::SpectralDenoiser;

use crate::config::DenoiseOptions;
use crate::error::PipelineResult;

/// Run the noise reduction transform over mono samples in place.
pub fn reduce_noise(
    samples: &mut [f32],
    sample_rate: u32,
    options: &DenoiseOptions,
) -> PipelineResult<()> {
    if !options.enabled {
        log::info!("Noise reduction disabled, passing samples through");
        return Ok(());
    }

    let mut denoiser = SpectralDenoiser::new(sample_rate, options);
    denoiser.estimate_noise_profile(samples)?;
    denoiser.process(samples)
}
