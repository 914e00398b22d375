//! Character profiles, voice-style presets and the per-emotion modifier table.

use super::params::{is_positive, VoiceParameterVector};
use crate::emotion::EmotionCategory;
use crate::tts::TtsError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ── Voice Styles ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStyle {
    Cute,
    Soft,
    Cool,
    Energetic,
}

impl VoiceStyle {
    pub const ALL: [VoiceStyle; 4] = [
        VoiceStyle::Cute,
        VoiceStyle::Soft,
        VoiceStyle::Cool,
        VoiceStyle::Energetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceStyle::Cute => "cute",
            VoiceStyle::Soft => "soft",
            VoiceStyle::Cool => "cool",
            VoiceStyle::Energetic => "energetic",
        }
    }
}

impl fmt::Display for VoiceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        VoiceStyle::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == needle)
            .ok_or_else(|| format!("unknown voice style: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceStylePreset {
    pub pitch_range: (f32, f32),
    pub formant_shift: f32,
    pub breathiness: f32,
    pub vibrato: f32,
}

// ── Character Profiles ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub id: String,
    pub base_pitch: f32,
    pub speaking_rate: f32,
    pub energy: f32,
    pub voice_style: VoiceStyle,
    pub accent: String,
    #[serde(default)]
    pub personality_traits: BTreeSet<String>,
    /// Backend voice identifier; characters without one use the default voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_voice: Option<String>,
}

impl CharacterProfile {
    /// Parse an untyped document, reporting missing fields as a profile error.
    pub fn from_value(id: &str, value: serde_json::Value) -> Result<Self, TtsError> {
        let mut profile: CharacterProfile = match value {
            serde_json::Value::Object(mut map) => {
                map.entry("id")
                    .or_insert_with(|| serde_json::Value::String(id.to_string()));
                serde_json::from_value(serde_json::Value::Object(map))
                    .map_err(|e| TtsError::InvalidProfile(format!("{}: {}", id, e)))?
            }
            other => {
                return Err(TtsError::InvalidProfile(format!(
                    "{}: expected an object, got {}",
                    id, other
                )))
            }
        };
        profile.id = id.to_string();
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), TtsError> {
        if self.id.trim().is_empty() {
            return Err(TtsError::InvalidProfile("character id is empty".into()));
        }
        if !is_valid_id(&self.id) {
            return Err(TtsError::InvalidProfile(format!(
                "character id '{}' may only contain ASCII letters, digits, '_' and '-'",
                self.id
            )));
        }
        for (name, value) in [
            ("base_pitch", self.base_pitch),
            ("speaking_rate", self.speaking_rate),
            ("energy", self.energy),
        ] {
            if !is_positive(value) {
                return Err(TtsError::InvalidProfile(format!(
                    "{}: {} must be positive, got {}",
                    self.id, name, value
                )));
            }
        }
        Ok(())
    }

    /// Baseline as a parameter vector.
    pub fn baseline(&self) -> VoiceParameterVector {
        VoiceParameterVector {
            pitch: self.base_pitch,
            speaking_rate: self.speaking_rate,
            energy: self.energy,
        }
    }
}

/// Ids double as file names, so they are restricted to `[A-Za-z0-9_-]`.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn character(
    id: &str,
    voice_style: VoiceStyle,
    base: (f32, f32, f32),
    accent: &str,
    traits: &[&str],
) -> CharacterProfile {
    CharacterProfile {
        id: id.to_string(),
        base_pitch: base.0,
        speaking_rate: base.1,
        energy: base.2,
        voice_style,
        accent: accent.to_string(),
        personality_traits: traits.iter().map(|t| t.to_string()).collect(),
        backend_voice: None,
    }
}

pub const DEFAULT_CHARACTER: &str = "sakura";

pub fn builtin_characters() -> Vec<CharacterProfile> {
    vec![
        character(
            "sakura",
            VoiceStyle::Cute,
            (1.2, 1.0, 1.1),
            "japanese_light",
            &["cheerful", "supportive", "gentle"],
        ),
        character(
            "yuki",
            VoiceStyle::Soft,
            (1.0, 0.9, 0.9),
            "japanese_medium",
            &["shy", "sweet", "thoughtful"],
        ),
        character(
            "rei",
            VoiceStyle::Cool,
            (0.9, 0.8, 0.8),
            "japanese_subtle",
            &["calm", "intelligent", "mysterious"],
        ),
        character(
            "miku",
            VoiceStyle::Energetic,
            (1.3, 1.2, 1.4),
            "japanese_strong",
            &["bubbly", "excited", "playful"],
        ),
    ]
}

// ── Voice Catalog ──────────────────────────────────────

/// Static voice tables loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCatalog {
    pub styles: BTreeMap<VoiceStyle, VoiceStylePreset>,
    /// Multiplicative modifiers applied to a character baseline per emotion.
    pub emotion_modifiers: BTreeMap<EmotionCategory, VoiceParameterVector>,
}

fn preset(pitch_range: (f32, f32), formant_shift: f32, breathiness: f32, vibrato: f32) -> VoiceStylePreset {
    VoiceStylePreset {
        pitch_range,
        formant_shift,
        breathiness,
        vibrato,
    }
}

fn modifier(pitch: f32, speaking_rate: f32, energy: f32) -> VoiceParameterVector {
    VoiceParameterVector {
        pitch,
        speaking_rate,
        energy,
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        use EmotionCategory::*;
        Self {
            styles: BTreeMap::from([
                (VoiceStyle::Cute, preset((1.1, 1.4), 0.1, 0.3, 0.2)),
                (VoiceStyle::Soft, preset((0.9, 1.2), 0.05, 0.4, 0.1)),
                (VoiceStyle::Cool, preset((0.8, 1.0), -0.05, 0.1, 0.05)),
                (VoiceStyle::Energetic, preset((1.2, 1.5), 0.15, 0.2, 0.3)),
            ]),
            emotion_modifiers: BTreeMap::from([
                (Cheerful, modifier(1.1, 1.05, 1.2)),
                (Giggly, modifier(1.2, 0.95, 1.3)),
                (Teasing, modifier(0.95, 0.9, 1.1)),
                (Shy, modifier(1.05, 0.8, 0.8)),
                (Excited, modifier(1.3, 1.2, 1.4)),
                (Sad, modifier(0.85, 0.7, 0.6)),
                (Neutral, modifier(1.0, 1.0, 1.0)),
                (Angry, modifier(1.15, 1.1, 1.3)),
                (Surprised, modifier(1.25, 1.15, 1.35)),
            ]),
        }
    }
}

impl VoiceCatalog {
    /// Preset for a style, falling back to `cute`.
    pub fn style(&self, style: VoiceStyle) -> VoiceStylePreset {
        self.styles
            .get(&style)
            .or_else(|| self.styles.get(&VoiceStyle::Cute))
            .copied()
            .unwrap_or(preset((1.1, 1.4), 0.1, 0.3, 0.2))
    }

    pub fn emotion_modifier(&self, emotion: EmotionCategory) -> VoiceParameterVector {
        self.emotion_modifiers
            .get(&emotion)
            .copied()
            .unwrap_or(VoiceParameterVector::NEUTRAL)
    }

    pub fn list_styles(&self) -> Vec<VoiceStyle> {
        self.styles.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_characters_are_positive() {
        for c in builtin_characters() {
            assert!(c.validate().is_ok(), "{} should validate", c.id);
            assert!(c.baseline().is_valid());
        }
    }

    #[test]
    fn from_value_reports_missing_fields() {
        let value = serde_json::json!({
            "base_pitch": 1.1,
            "voice_style": "soft",
            "accent": "none"
        });
        let err = CharacterProfile::from_value("hana", value).unwrap_err();
        assert!(matches!(err, TtsError::InvalidProfile(_)));
    }

    #[test]
    fn from_value_rejects_non_positive_energy() {
        let value = serde_json::json!({
            "base_pitch": 1.1,
            "speaking_rate": 1.0,
            "energy": -0.5,
            "voice_style": "soft",
            "accent": "none"
        });
        assert!(CharacterProfile::from_value("hana", value).is_err());
    }

    #[test]
    fn from_value_takes_id_from_argument() {
        let value = serde_json::json!({
            "id": "ignored",
            "base_pitch": 1.1,
            "speaking_rate": 1.0,
            "energy": 0.9,
            "voice_style": "energetic",
            "accent": "kansai",
            "personality_traits": ["loud"]
        });
        let profile = CharacterProfile::from_value("hana", value).unwrap();
        assert_eq!(profile.id, "hana");
        assert_eq!(profile.voice_style, VoiceStyle::Energetic);
        assert!(profile.personality_traits.contains("loud"));
    }

    #[test]
    fn ids_with_path_characters_are_rejected() {
        let base = builtin_characters().remove(0);
        for id in ["x/../../escaped", "..", "a b", "hana.json", "c:\\temp", "ハナ"] {
            let profile = CharacterProfile {
                id: id.to_string(),
                ..base.clone()
            };
            assert!(
                matches!(profile.validate(), Err(TtsError::InvalidProfile(_))),
                "{:?} should be rejected",
                id
            );
        }
        for id in ["hana", "hana_2", "Hana-Chan"] {
            let profile = CharacterProfile {
                id: id.to_string(),
                ..base.clone()
            };
            assert!(profile.validate().is_ok(), "{:?} should be accepted", id);
        }
    }

    #[test]
    fn catalog_covers_every_emotion() {
        let catalog = VoiceCatalog::default();
        for emotion in EmotionCategory::ALL {
            assert!(catalog.emotion_modifiers.contains_key(&emotion));
        }
        assert_eq!(catalog.list_styles().len(), 4);
    }

    #[test]
    fn unknown_style_parse_fails() {
        assert!("sultry".parse::<VoiceStyle>().is_err());
        assert_eq!("Cool".parse::<VoiceStyle>(), Ok(VoiceStyle::Cool));
    }
}
