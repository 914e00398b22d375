use crate::tts::TtsError;
use serde::{Deserialize, Serialize};

/// Multiplicative deviation from a neutral voice (1.0 = unmodified).
///
/// Every field is finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParameterVector {
    pub pitch: f32,
    #[serde(alias = "speed")]
    pub speaking_rate: f32,
    pub energy: f32,
}

impl Default for VoiceParameterVector {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl VoiceParameterVector {
    pub const NEUTRAL: VoiceParameterVector = VoiceParameterVector {
        pitch: 1.0,
        speaking_rate: 1.0,
        energy: 1.0,
    };

    pub fn new(pitch: f32, speaking_rate: f32, energy: f32) -> Result<Self, TtsError> {
        let v = Self {
            pitch,
            speaking_rate,
            energy,
        };
        if v.is_valid() {
            Ok(v)
        } else {
            Err(TtsError::InvalidParameter(format!(
                "voice parameters must be positive: pitch={}, rate={}, energy={}",
                pitch, speaking_rate, energy
            )))
        }
    }

    pub fn is_valid(&self) -> bool {
        is_positive(self.pitch) && is_positive(self.speaking_rate) && is_positive(self.energy)
    }

    /// Field-wise product.
    pub fn scaled_by(&self, modifier: &VoiceParameterVector) -> VoiceParameterVector {
        VoiceParameterVector {
            pitch: self.pitch * modifier.pitch,
            speaking_rate: self.speaking_rate * modifier.speaking_rate,
            energy: self.energy * modifier.energy,
        }
    }
}

/// Caller-supplied replacements for individual fields of the composited vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverrides {
    #[serde(default)]
    pub pitch: Option<f32>,
    #[serde(default, alias = "speed")]
    pub speaking_rate: Option<f32>,
    #[serde(default)]
    pub energy: Option<f32>,
}

impl ParameterOverrides {
    pub fn validate(&self) -> Result<(), TtsError> {
        for (name, value) in [
            ("pitch", self.pitch),
            ("speed", self.speaking_rate),
            ("energy", self.energy),
        ] {
            if let Some(v) = value {
                if !is_positive(v) {
                    return Err(TtsError::InvalidParameter(format!(
                        "{} override must be a positive number, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pitch.is_none() && self.speaking_rate.is_none() && self.energy.is_none()
    }
}

pub(crate) fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}
