//! Parameter composition: character baseline × emotion modifier, then style
//! fields, then caller overrides.

use super::params::{ParameterOverrides, VoiceParameterVector};
use super::profile::{CharacterProfile, VoiceStyle, VoiceStylePreset};
use serde::{Deserialize, Serialize};

/// Final synthesis settings for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub character_id: String,
    pub voice_style: VoiceStyle,
    pub parameters: VoiceParameterVector,
    pub pitch_range: (f32, f32),
    pub formant_shift: f32,
    pub breathiness: f32,
    pub vibrato: f32,
    pub accent: String,
}

/// Compose the final settings.
///
/// Overrides replace the composited field rather than scaling it, so an
/// explicit value always wins over character and emotion. The style's
/// breathiness and vibrato are carried along for the effect layer, where they
/// apply unless the character preset or emotion overlay set those effects.
pub fn compose(
    character: &CharacterProfile,
    emotion_params: &VoiceParameterVector,
    style_name: VoiceStyle,
    style: &VoiceStylePreset,
    overrides: &ParameterOverrides,
) -> VoiceSettings {
    let mut parameters = character.baseline().scaled_by(emotion_params);

    if let Some(pitch) = overrides.pitch {
        parameters.pitch = pitch;
    }
    if let Some(rate) = overrides.speaking_rate {
        parameters.speaking_rate = rate;
    }
    if let Some(energy) = overrides.energy {
        parameters.energy = energy;
    }

    VoiceSettings {
        character_id: character.id.clone(),
        voice_style: style_name,
        parameters,
        pitch_range: style.pitch_range,
        formant_shift: style.formant_shift,
        breathiness: style.breathiness,
        vibrato: style.vibrato,
        accent: character.accent.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionCategory;
    use crate::voice::{builtin_characters, VoiceCatalog};

    fn sakura() -> CharacterProfile {
        builtin_characters()
            .into_iter()
            .find(|c| c.id == "sakura")
            .unwrap()
    }

    #[test]
    fn baseline_times_emotion_modifier() {
        let catalog = VoiceCatalog::default();
        let character = sakura();
        let modifier = catalog.emotion_modifier(EmotionCategory::Cheerful);
        let style = catalog.style(character.voice_style);
        let settings = compose(
            &character,
            &modifier,
            character.voice_style,
            &style,
            &ParameterOverrides::default(),
        );
        assert!((settings.parameters.pitch - 1.32).abs() < 1e-5);
        assert!((settings.parameters.speaking_rate - 1.05).abs() < 1e-5);
        assert!((settings.parameters.energy - 1.32).abs() < 1e-5);
        assert_eq!(settings.formant_shift, 0.1);
        assert_eq!(settings.breathiness, 0.3);
        assert_eq!(settings.vibrato, 0.2);
    }

    #[test]
    fn overrides_replace_fields() {
        let catalog = VoiceCatalog::default();
        let character = sakura();
        let overrides = ParameterOverrides {
            pitch: Some(0.7),
            energy: Some(2.0),
            ..Default::default()
        };
        let settings = compose(
            &character,
            &catalog.emotion_modifier(EmotionCategory::Excited),
            VoiceStyle::Cool,
            &catalog.style(VoiceStyle::Cool),
            &overrides,
        );
        assert_eq!(settings.parameters.pitch, 0.7);
        assert_eq!(settings.parameters.energy, 2.0);
        assert!((settings.parameters.speaking_rate - 1.2).abs() < 1e-5);
        assert_eq!(settings.voice_style, VoiceStyle::Cool);
        assert_eq!(settings.formant_shift, -0.05);
    }
}
