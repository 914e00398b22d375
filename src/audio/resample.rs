//! Sample-rate conversion using rubato.

use crate::tts::TtsError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Resample by an arbitrary ratio (output rate / input rate).
///
/// The filter delay is trimmed, so the output length is `round(len * ratio)`.
pub fn resample_ratio(samples: &[f32], ratio: f64) -> Result<Vec<f32>, TtsError> {
    if samples.is_empty() || (ratio - 1.0).abs() < f64::EPSILON {
        return Ok(samples.to_vec());
    }
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(TtsError::Effect(format!("invalid resample ratio {}", ratio)));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| TtsError::Effect(format!("resampler setup: {}", e)))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let input = vec![samples.to_vec()];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| TtsError::Effect(format!("resample: {}", e)))?
        .into_iter()
        .next()
        .unwrap_or_default();

    // Flush the filter tail until the delayed signal is fully out.
    while output.len() < delay + expected {
        let tail = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| TtsError::Effect(format!("resample flush: {}", e)))?
            .into_iter()
            .next()
            .unwrap_or_default();
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    let mut trimmed: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    trimmed.resize(expected, 0.0);
    Ok(trimmed)
}

/// Resample between two sample rates.
pub fn resample(samples: &[f32], from_sr: u32, to_sr: u32) -> Result<Vec<f32>, TtsError> {
    if from_sr == to_sr {
        return Ok(samples.to_vec());
    }
    if from_sr == 0 || to_sr == 0 {
        return Err(TtsError::Effect(format!(
            "invalid sample rates {} -> {}",
            from_sr, to_sr
        )));
    }
    resample_ratio(samples, to_sr as f64 / from_sr as f64)
}
