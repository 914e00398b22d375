//! Character effect presets and per-emotion overlays.

use super::effects::EffectParameters;
use crate::emotion::EmotionCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectPreset {
    Cute,
    Soft,
    Energetic,
    Teasing,
}

impl EffectPreset {
    /// Fixed character lookup; style names map to their own preset.
    pub fn for_character(character: &str) -> EffectPreset {
        match character {
            "sakura" | "cute" => EffectPreset::Cute,
            "yuki" | "soft" => EffectPreset::Soft,
            "miku" | "energetic" => EffectPreset::Energetic,
            "rei" | "teasing" => EffectPreset::Teasing,
            _ => EffectPreset::Cute,
        }
    }

    pub fn parameters(&self) -> EffectParameters {
        let (pitch_shift, formant_shift, brightness, room, chorus) = match self {
            EffectPreset::Cute => (0.2, 0.15, 0.3, 0.2, 0.1),
            EffectPreset::Soft => (0.1, 0.05, -0.1, 0.3, 0.05),
            EffectPreset::Energetic => (0.3, 0.2, 0.4, 0.1, 0.2),
            EffectPreset::Teasing => (-0.1, -0.05, 0.2, 0.25, 0.15),
        };
        EffectParameters {
            pitch_shift: Some(pitch_shift),
            formant_shift: Some(formant_shift),
            brightness: Some(brightness),
            extra: BTreeMap::from([
                ("reverb_room_size".to_string(), room),
                ("chorus_depth".to_string(), chorus),
            ]),
            ..Default::default()
        }
    }
}

/// Up to two extra fields contributed by the emotion.
pub fn emotion_overlay(emotion: EmotionCategory) -> EffectParameters {
    let mut overlay = EffectParameters::default();
    match emotion {
        EmotionCategory::Cheerful => {
            overlay.brightness = Some(0.2);
            overlay.energy_boost = Some(0.1);
        }
        EmotionCategory::Giggly => {
            overlay.pitch_variation = Some(0.15);
            overlay.extra.insert("tempo_variation".into(), 0.1);
        }
        EmotionCategory::Teasing => {
            overlay.extra.insert("pitch_bend".into(), 0.1);
            overlay.extra.insert("sultry_effect".into(), 0.2);
        }
        EmotionCategory::Shy => {
            overlay.volume_reduction = Some(0.2);
            overlay.breathiness = Some(0.3);
        }
        EmotionCategory::Excited => {
            overlay.energy_boost = Some(0.3);
            overlay.pitch_variation = Some(0.2);
        }
        EmotionCategory::Sad => {
            overlay.extra.insert("pitch_lower".into(), 0.2);
            overlay.extra.insert("reverb_increase".into(), 0.3);
        }
        EmotionCategory::Neutral | EmotionCategory::Angry | EmotionCategory::Surprised => {}
    }
    overlay
}

/// Character preset with the emotion overlay merged on top.
pub fn character_effects(character: &str, emotion: EmotionCategory) -> EffectParameters {
    EffectPreset::for_character(character)
        .parameters()
        .overlay(&emotion_overlay(emotion))
}
