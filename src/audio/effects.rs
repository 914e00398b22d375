//! Ordered waveform transforms applied after synthesis.
//!
//! Every stage is optional and keyed by its field in [`EffectParameters`].
//! A stage that fails, or whose capability is switched off, leaves the
//! waveform untouched; the chain as a whole never fails.

use super::resample::resample_ratio;
use crate::tts::TtsError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const ENERGY_THRESHOLD: f32 = 0.1;
const VIBRATO_RATE_HZ: f32 = 4.0;
const TARGET_LEVEL_DB: f32 = -3.0;
pub const LIMIT_THRESHOLD: f32 = 0.95;

// ── Parameters ─────────────────────────────────────────

/// Effect amounts; an absent field disables its stage.
///
/// Keys without a stage of their own (reverb, chorus, tempo hints) are kept
/// in `extra` so presets and overlays round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_shift: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formant_shift: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_boost: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_variation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_reduction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breathiness: Option<f32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, f32>,
}

impl EffectParameters {
    /// Merge `other` on top of `self`; fields present in `other` win.
    pub fn overlay(&self, other: &EffectParameters) -> EffectParameters {
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), *v)));
        EffectParameters {
            pitch_shift: other.pitch_shift.or(self.pitch_shift),
            formant_shift: other.formant_shift.or(self.formant_shift),
            brightness: other.brightness.or(self.brightness),
            energy_boost: other.energy_boost.or(self.energy_boost),
            pitch_variation: other.pitch_variation.or(self.pitch_variation),
            volume_reduction: other.volume_reduction.or(self.volume_reduction),
            breathiness: other.breathiness.or(self.breathiness),
            extra,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pitch_shift.is_none()
            && self.formant_shift.is_none()
            && self.brightness.is_none()
            && self.energy_boost.is_none()
            && self.pitch_variation.is_none()
            && self.volume_reduction.is_none()
            && self.breathiness.is_none()
            && self.extra.is_empty()
    }
}

/// Which signal-processing families are available to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectCapabilities {
    /// Pitch shift and sample-rate conversion.
    pub resampling: bool,
    /// Brightness emphasis / low-pass.
    pub filtering: bool,
    /// Vibrato.
    pub modulation: bool,
    /// Breathiness noise.
    pub noise: bool,
}

impl Default for EffectCapabilities {
    fn default() -> Self {
        Self {
            resampling: true,
            filtering: true,
            modulation: true,
            noise: true,
        }
    }
}

impl EffectCapabilities {
    pub fn none() -> Self {
        Self {
            resampling: false,
            filtering: false,
            modulation: false,
            noise: false,
        }
    }
}

// ── Chain ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EffectsChain {
    sample_rate: u32,
    capabilities: EffectCapabilities,
    seed: Option<u64>,
}

impl EffectsChain {
    pub fn new(sample_rate: u32, capabilities: EffectCapabilities) -> Self {
        Self {
            sample_rate,
            capabilities,
            seed: None,
        }
    }

    /// Fix the noise generator seed so breathiness is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn capabilities(&self) -> EffectCapabilities {
        self.capabilities
    }

    /// Run the full pipeline, ending with normalization and soft limiting.
    pub fn apply(&self, samples: &[f32], effects: &EffectParameters) -> Vec<f32> {
        let mut audio: Vec<f32> = samples
            .iter()
            .map(|s| if s.is_finite() { *s } else { 0.0 })
            .collect();
        if audio.is_empty() {
            return audio;
        }

        if let Some(shift) = effects.pitch_shift {
            audio = if self.capabilities.resampling {
                run_stage("pitch_shift", audio, |a| pitch_shift(a, shift * 12.0))
            } else {
                debug!("[Effects] Resampling unavailable, skipping pitch shift");
                audio
            };
        }

        if let Some(brightness) = effects.brightness {
            if self.capabilities.filtering {
                audio = run_stage("brightness", audio, |a| Ok(adjust_brightness(a, brightness)));
            }
        }

        if let Some(boost) = effects.energy_boost {
            audio = run_stage("energy_boost", audio, |a| Ok(energy_boost(a, boost)));
        }

        if let Some(variation) = effects.pitch_variation {
            if self.capabilities.modulation {
                let rate = self.sample_rate;
                audio = run_stage("pitch_variation", audio, |a| {
                    vibrato(a, variation, rate)
                });
            }
        }

        if let Some(reduction) = effects.volume_reduction {
            audio = run_stage("volume_reduction", audio, |a| {
                Ok(a.iter().map(|s| s * (1.0 - reduction)).collect())
            });
        }

        if let Some(breathiness) = effects.breathiness {
            if self.capabilities.noise {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                audio = run_stage("breathiness", audio, |a| add_breathiness(a, breathiness, &mut rng));
            }
        }

        audio = run_stage("normalize", audio, |a| Ok(normalize(a, TARGET_LEVEL_DB)));
        soft_limit(&audio, LIMIT_THRESHOLD)
    }
}

/// Run one stage; on error or non-finite output keep the input.
fn run_stage<F>(name: &str, input: Vec<f32>, stage: F) -> Vec<f32>
where
    F: FnOnce(&[f32]) -> Result<Vec<f32>, TtsError>,
{
    match stage(&input) {
        Ok(out) if out.iter().all(|s| s.is_finite()) => out,
        Ok(_) => {
            warn!("[Effects] Stage '{}' produced non-finite samples, skipped", name);
            input
        }
        Err(e) => {
            warn!("[Effects] Stage '{}' failed, skipped: {}", name, e);
            input
        }
    }
}

// ── Stages ─────────────────────────────────────────────

/// Resampling-based shift; duration scales with the pitch change.
pub fn pitch_shift(samples: &[f32], semitones: f32) -> Result<Vec<f32>, TtsError> {
    if semitones == 0.0 {
        return Ok(samples.to_vec());
    }
    let factor = 2f64.powf(semitones as f64 / 12.0);
    resample_ratio(samples, 1.0 / factor)
}

pub fn adjust_brightness(samples: &[f32], brightness: f32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    if brightness > 0.0 {
        let mut prev = samples[0];
        samples
            .iter()
            .map(|&x| {
                let diff = x - prev;
                prev = x;
                x + brightness * diff * 0.5
            })
            .collect()
    } else {
        let alpha = 0.8 + brightness * 0.2;
        let mut out = Vec::with_capacity(samples.len());
        let mut state = samples[0];
        out.push(state);
        for &x in &samples[1..] {
            state = alpha * state + (1.0 - alpha) * x;
            out.push(state);
        }
        out
    }
}

/// Expand samples above the threshold by `1 + boost`, keeping sign.
pub fn energy_boost(samples: &[f32], boost: f32) -> Vec<f32> {
    let ratio = 1.0 + boost;
    samples
        .iter()
        .map(|&x| {
            let mag = x.abs();
            if mag > ENERGY_THRESHOLD {
                x.signum() * (ENERGY_THRESHOLD + (mag - ENERGY_THRESHOLD) * ratio)
            } else {
                x
            }
        })
        .collect()
}

/// Coarse 4 Hz vibrato by per-sample time-axis lookup.
pub fn vibrato(samples: &[f32], variation: f32, sample_rate: u32) -> Result<Vec<f32>, TtsError> {
    if sample_rate == 0 {
        return Err(TtsError::Effect("vibrato needs a sample rate".into()));
    }
    let depth = variation * 0.5;
    let mut out = samples.to_vec();
    for (i, slot) in out.iter_mut().enumerate().skip(1) {
        let t = i as f32 / sample_rate as f32;
        let semitones = (2.0 * std::f32::consts::PI * VIBRATO_RATE_HZ * t).sin() * depth;
        let factor = 2f32.powf(semitones / 12.0);
        if factor != 1.0 {
            let src = (i as f32 / factor).floor() as usize;
            *slot = samples.get(src).copied().unwrap_or(samples[i]);
        }
    }
    Ok(out)
}

/// Gaussian noise, masked so it is strongest where the signal is quiet.
pub fn add_breathiness(
    samples: &[f32],
    breathiness: f32,
    rng: &mut StdRng,
) -> Result<Vec<f32>, TtsError> {
    let normal = Normal::new(0.0f32, 0.02 * breathiness)
        .map_err(|e| TtsError::Effect(format!("breathiness noise: {}", e)))?;
    Ok(samples
        .iter()
        .map(|&x| {
            let mask = 1.0 - (x.abs() * 10.0).clamp(0.0, 1.0);
            x + normal.sample(rng) * mask
        })
        .collect())
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Scale to `target_db` dBFS RMS. Pure silence is returned unchanged.
pub fn normalize(samples: &[f32], target_db: f32) -> Vec<f32> {
    let level = rms(samples);
    if level == 0.0 {
        return samples.to_vec();
    }
    let gain = 10f32.powf(target_db / 20.0) / level;
    samples.iter().map(|s| s * gain).collect()
}

/// `threshold * tanh(x / threshold)` above the threshold; identity below.
pub fn soft_limit(samples: &[f32], threshold: f32) -> Vec<f32> {
    samples
        .iter()
        .map(|&x| {
            if x.abs() <= threshold {
                x
            } else {
                threshold * (x / threshold).tanh()
            }
        })
        .collect()
}

// ── Analysis ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub duration: f32,
    pub sample_rate: u32,
    pub samples: usize,
    pub rms_level: f32,
    pub peak_level: f32,
    pub dynamic_range: f32,
}

pub fn audio_info(samples: &[f32], sample_rate: u32) -> AudioInfo {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let floor = if samples.is_empty() {
        0.0
    } else {
        samples.iter().fold(f32::INFINITY, |m, s| m.min(s.abs()))
    };
    AudioInfo {
        duration: if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f32 / sample_rate as f32
        },
        sample_rate,
        samples: samples.len(),
        rms_level: rms(samples),
        peak_level: peak,
        dynamic_range: peak - floor,
    }
}
