//! Surface speech-pattern analysis used for synthesis planning reports.

use super::category::EmotionCategory;
use super::lexicon::EmotionLexicon;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));
static EMOTICON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[:;=8][\-o\*']?[\)\]\(\[dDpP/\\|oO0]|\^[_\-]?\^").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechRhythm {
    Energetic,
    Thoughtful,
    Curious,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechPatterns {
    pub sentence_count: usize,
    pub exclamation_count: usize,
    pub question_count: usize,
    pub ellipsis_count: usize,
    pub tilde_count: usize,
    pub has_japanese: bool,
    pub emoticon_count: usize,
    pub rhythm: SpeechRhythm,
}

pub fn analyze_speech_patterns(text: &str) -> SpeechPatterns {
    let sentence_count = SENTENCE_SPLIT_RE
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count();
    let exclamation_count = text.matches('!').count();
    let question_count = text.matches('?').count();
    let ellipsis_count = text.matches("...").count() + text.matches('…').count();
    let tilde_count = text.matches('~').count();

    let rhythm = if exclamation_count > 1 {
        SpeechRhythm::Energetic
    } else if ellipsis_count > 0 {
        SpeechRhythm::Thoughtful
    } else if question_count > 0 {
        SpeechRhythm::Curious
    } else {
        SpeechRhythm::Normal
    };

    SpeechPatterns {
        sentence_count,
        exclamation_count,
        question_count,
        ellipsis_count,
        tilde_count,
        has_japanese: contains_japanese(text),
        emoticon_count: EMOTICON_RE.find_iter(text).count(),
        rhythm,
    }
}

/// True if any character falls in the hiragana, katakana, CJK or half-width katakana blocks.
pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c as u32,
            0x3040..=0x309F | 0x30A0..=0x30FF | 0x4E00..=0x9FAF | 0xFF65..=0xFF9F)
    })
}

/// Recognised Japanese expressions in `text` with their syllable guides.
pub fn pronunciation_guide(lexicon: &EmotionLexicon, text: &str) -> Vec<(String, String)> {
    let lower = text.to_lowercase();
    lexicon
        .expressions()
        .iter()
        .filter(|e| {
            lower.contains(e.romanized.as_str())
                || e.native.as_deref().is_some_and(|n| lower.contains(n))
        })
        .map(|e| (e.romanized.clone(), e.pronunciation.clone()))
        .collect()
}

/// Built-in character best suited to an emotion.
pub fn recommend_character(emotion: EmotionCategory) -> &'static str {
    match emotion {
        EmotionCategory::Cheerful => "sakura",
        EmotionCategory::Giggly | EmotionCategory::Excited => "miku",
        EmotionCategory::Teasing => "rei",
        EmotionCategory::Shy | EmotionCategory::Sad => "yuki",
        _ => "sakura",
    }
}
