//! Markup document sent to the speech backend.
//!
//! Embeds the voice, an expression style and prosody percentages derived
//! from the composited parameter vector, with breaks around expressive
//! punctuation and emphasis on recognised phrases.

use crate::emotion::EmotionCategory;
use crate::voice::{CharacterProfile, VoiceParameterVector};
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";
const STYLE_DEGREE: f32 = 1.5;

/// Romanized phrase → spelling the backend pronounces well.
const PRONUNCIATIONS: &[(&str, &str)] = &[
    ("konnichiwa", "koh-nee-chee-wah"),
    ("ohayo", "oh-hah-yoh"),
    ("arigatou", "ah-ree-gah-toh"),
    ("ara ara", "ah-rah ah-rah"),
    ("ehehe", "eh-heh-heh"),
    ("ufufu", "oo-foo-foo"),
    ("kawaii", "kah-wah-ee"),
    ("sugoi", "soo-goh-ee"),
    ("baka", "bah-kah"),
    ("onegai", "oh-neh-gah-ee"),
    ("gomen", "goh-men"),
    ("kyaa", "kyah"),
    ("yatta", "yah-ttah"),
];

/// (phrase, emphasis level, trailing break ms)
const EMPHASIS: &[(&str, &str, u32)] = &[
    ("ah-rah ah-rah", "strong", 400),
    ("eh-heh-heh", "moderate", 300),
    ("oo-foo-foo", "moderate", 300),
    ("kah-wah-ee", "strong", 200),
    ("soo-goh-ee", "strong", 200),
];

static PRONUNCIATION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PRONUNCIATIONS
        .iter()
        .map(|(original, spoken)| {
            let re = Regex::new(&format!("(?i){}", regex::escape(original))).expect("valid regex");
            (re, *spoken)
        })
        .collect()
});

/// Voice and expression chosen for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSelection {
    pub voice_id: String,
    pub style: String,
}

/// Built-in backend voice per character.
pub fn character_voice(character_id: &str) -> Option<&'static str> {
    match character_id {
        "sakura" => Some("en-US-JennyNeural"),
        "yuki" => Some("en-US-AriaNeural"),
        "rei" => Some("en-US-SaraNeural"),
        "miku" => Some("en-US-MichelleNeural"),
        _ => None,
    }
}

/// Backend expression style for an emotion.
pub fn expression_style(emotion: EmotionCategory) -> &'static str {
    match emotion {
        EmotionCategory::Cheerful => "cheerful",
        EmotionCategory::Giggly => "excited",
        EmotionCategory::Teasing => "chat",
        EmotionCategory::Shy => "gentle",
        EmotionCategory::Excited => "excited",
        EmotionCategory::Sad => "sad",
        EmotionCategory::Neutral => "chat",
        EmotionCategory::Angry => "angry",
        EmotionCategory::Surprised => "excited",
    }
}

/// The profile's own backend voice wins over the built-in mapping.
pub fn select_voice(
    character: &CharacterProfile,
    emotion: EmotionCategory,
    default_voice: &str,
) -> VoiceSelection {
    let voice_id = character
        .backend_voice
        .clone()
        .or_else(|| character_voice(&character.id).map(str::to_string))
        .unwrap_or_else(|| default_voice.to_string());
    VoiceSelection {
        voice_id,
        style: expression_style(emotion).to_string(),
    }
}

/// Signed percentage deviation of a multiplier, e.g. 1.32 → "+32%".
pub fn percent(multiplier: f32) -> String {
    let pct = ((multiplier - 1.0) * 100.0).round() as i32;
    if pct >= 0 {
        format!("+{}%", pct)
    } else {
        format!("{}%", pct)
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Rewrite recognised Japanese phrases into backend-friendly spellings.
pub fn apply_pronunciations(text: &str) -> String {
    let mut processed = text.to_string();
    for (re, spoken) in PRONUNCIATION_RES.iter() {
        processed = re.replace_all(&processed, *spoken).into_owned();
    }
    processed
}

fn brk(ms: u32) -> String {
    format!("<break time=\"{}ms\"/>", ms)
}

/// Insert emphasis and timing breaks. Input must already be escaped.
pub fn add_expression_breaks(text: &str) -> String {
    let mut out = text.replace('♪', &format!("{}♪{}", brk(300), brk(200)));
    out = out.replace('~', &format!("~{}", brk(250)));

    for (phrase, level, ms) in EMPHASIS {
        out = out.replace(
            phrase,
            &format!("<emphasis level=\"{}\">{}</emphasis>{}", level, phrase, brk(*ms)),
        );
    }

    out = out.replace('!', &format!("{}!", brk(200)));
    out = out.replace('?', &format!("{}?", brk(300)));
    out = out.replace("...", &format!("{}...", brk(500)));
    out.replace('…', &format!("{}…", brk(500)))
}

pub fn build_ssml(text: &str, voice: &VoiceSelection, params: &VoiceParameterVector) -> String {
    let body = add_expression_breaks(&escape_xml(&apply_pronunciations(text)));
    format!(
        concat!(
            "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" ",
            "xmlns:mstts=\"https://www.w3.org/2001/mstts\" xml:lang=\"en-US\">",
            "<voice name=\"{voice}\">",
            "<mstts:express-as style=\"{style}\" styledegree=\"{degree}\">",
            "<prosody pitch=\"{pitch}\" rate=\"{rate}\" volume=\"{volume}\">",
            "{body}",
            "</prosody></mstts:express-as></voice></speak>"
        ),
        voice = escape_xml(&voice.voice_id),
        style = escape_xml(&voice.style),
        degree = STYLE_DEGREE,
        pitch = percent(params.pitch),
        rate = percent(params.speaking_rate),
        volume = percent(params.energy),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::builtin_characters;

    fn sakura() -> CharacterProfile {
        builtin_characters()
            .into_iter()
            .find(|c| c.id == "sakura")
            .unwrap()
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(percent(1.32), "+32%");
        assert_eq!(percent(1.0), "+0%");
        assert_eq!(percent(0.85), "-15%");
    }

    #[test]
    fn pronunciation_is_case_insensitive() {
        assert_eq!(apply_pronunciations("Konnichiwa!"), "koh-nee-chee-wah!");
        assert_eq!(apply_pronunciations("ARA ARA~"), "ah-rah ah-rah~");
    }

    #[test]
    fn breaks_around_punctuation() {
        let out = add_expression_breaks("Hi! Really? Well... ♪~");
        assert!(out.contains("<break time=\"200ms\"/>!"));
        assert!(out.contains("<break time=\"300ms\"/>?"));
        assert!(out.contains("<break time=\"500ms\"/>..."));
        assert!(out.contains("<break time=\"300ms\"/>♪<break time=\"200ms\"/>"));
        assert!(out.contains("~<break time=\"250ms\"/>"));
    }

    #[test]
    fn emphasis_on_expressive_phrases() {
        let out = add_expression_breaks(&apply_pronunciations("ara ara, kawaii"));
        assert!(out.contains("<emphasis level=\"strong\">ah-rah ah-rah</emphasis><break time=\"400ms\"/>"));
        assert!(out.contains("<emphasis level=\"strong\">kah-wah-ee</emphasis>"));
    }

    #[test]
    fn document_carries_voice_style_and_prosody() {
        let voice = select_voice(&sakura(), EmotionCategory::Cheerful, DEFAULT_VOICE);
        let params = VoiceParameterVector {
            pitch: 1.32,
            speaking_rate: 1.05,
            energy: 0.9,
        };
        let doc = build_ssml("Tom & Jerry <3", &voice, &params);
        assert!(doc.contains("<voice name=\"en-US-JennyNeural\">"));
        assert!(doc.contains("style=\"cheerful\" styledegree=\"1.5\""));
        assert!(doc.contains("pitch=\"+32%\" rate=\"+5%\" volume=\"-10%\""));
        assert!(doc.contains("Tom &amp; Jerry &lt;3"));
    }

    #[test]
    fn profile_voice_overrides_builtin() {
        let mut character = sakura();
        character.backend_voice = Some("en-US-AnaNeural".into());
        let voice = select_voice(&character, EmotionCategory::Shy, DEFAULT_VOICE);
        assert_eq!(voice.voice_id, "en-US-AnaNeural");
        assert_eq!(voice.style, "gentle");
    }

    #[test]
    fn unknown_character_uses_default_voice() {
        let mut character = sakura();
        character.id = "hana".into();
        let voice = select_voice(&character, EmotionCategory::Neutral, DEFAULT_VOICE);
        assert_eq!(voice.voice_id, DEFAULT_VOICE);
        assert_eq!(voice.style, "chat");
    }
}
