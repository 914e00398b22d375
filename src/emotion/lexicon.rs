//! Static emotion lexicon: per-category match patterns, Japanese expression
//! mappings and the per-category blend weight table.
//!
//! The tables are plain data (`LexiconTables`, serde-friendly) compiled once
//! into an [`EmotionLexicon`] so the classifier stays a pure function over it.

use super::category::EmotionCategory;
use crate::tts::TtsError;
use crate::voice::VoiceParameterVector;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Table data ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSet {
    pub emotion: EmotionCategory,
    pub patterns: Vec<String>,
}

/// A Japanese expression recognised in romanized or native script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JapaneseExpression {
    pub romanized: String,
    #[serde(default)]
    pub native: Option<String>,
    pub emotion: EmotionCategory,
    /// Syllable guide, e.g. `kon-ni-chi-wa`.
    pub pronunciation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconTables {
    pub patterns: Vec<PatternSet>,
    pub expressions: Vec<JapaneseExpression>,
    pub weights: BTreeMap<EmotionCategory, VoiceParameterVector>,
}

fn pattern_set(emotion: EmotionCategory, patterns: &[&str]) -> PatternSet {
    PatternSet {
        emotion,
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}

fn expression(
    romanized: &str,
    native: &str,
    emotion: EmotionCategory,
    pronunciation: &str,
) -> JapaneseExpression {
    JapaneseExpression {
        romanized: romanized.to_string(),
        native: Some(native.to_string()),
        emotion,
        pronunciation: pronunciation.to_string(),
    }
}

fn weight(pitch: f32, speaking_rate: f32, energy: f32) -> VoiceParameterVector {
    VoiceParameterVector {
        pitch,
        speaking_rate,
        energy,
    }
}

impl Default for LexiconTables {
    fn default() -> Self {
        use EmotionCategory::*;

        // Matched against lowercased text.
        let patterns = vec![
            pattern_set(
                Cheerful,
                &[
                    r"!(.*?)!", "♪", "yay", "awesome", "great", "wonderful", "happy", "joy",
                    "smile", "laugh",
                ],
            ),
            pattern_set(
                Giggly,
                &[
                    "ehehe", "hehe", "hihi", "ufufu", "funny", "lol", "haha", "giggle", "tehe",
                ],
            ),
            pattern_set(
                Teasing,
                &[
                    "ara ara",
                    "ara~",
                    r"ohh?",
                    r"really\?",
                    "is that so",
                    "hmm~",
                    "interesting",
                    r"~$",
                ],
            ),
            pattern_set(
                Shy,
                &[
                    r"um+", r"uh+", "maybe", "perhaps", "i think", "sort of", "kind of", "blush",
                    "embarrass",
                ],
            ),
            pattern_set(
                Excited,
                &[
                    r"wow!+",
                    r"amazing!+",
                    r"incredible!+",
                    r"fantastic!+",
                    r"yes!+",
                    "omg",
                    "can't wait",
                ],
            ),
            pattern_set(
                Sad,
                &[
                    "sad", "cry", "tears", "sorry", "hurt", "pain", "disappointed", "upset",
                ],
            ),
        ];

        let expressions = vec![
            expression("konnichiwa", "こんにちは", Cheerful, "kon-ni-chi-wa"),
            expression("ohayo", "おはよう", Cheerful, "o-ha-yo"),
            expression("arigatou", "ありがとう", Cheerful, "a-ri-ga-to-u"),
            expression("sumimasen", "すみません", Shy, "su-mi-ma-sen"),
            expression("ara ara", "あらあら", Teasing, "a-ra a-ra"),
            expression("ehehe", "えへへ", Giggly, "e-he-he"),
            expression("ufufu", "うふふ", Giggly, "u-fu-fu"),
            expression("baka", "ばか", Teasing, "ba-ka"),
            expression("kawaii", "かわいい", Excited, "ka-wa-ii"),
            expression("sugoi", "すごい", Excited, "su-go-i"),
            expression("onegai", "おねがい", Shy, "o-ne-gai"),
            expression("gomen", "ごめん", Sad, "go-men"),
        ];

        let weights = BTreeMap::from([
            (Cheerful, weight(1.2, 1.1, 1.3)),
            (Giggly, weight(1.3, 0.9, 1.4)),
            (Teasing, weight(0.9, 0.8, 1.1)),
            (Shy, weight(1.1, 0.7, 0.8)),
            (Excited, weight(1.4, 1.3, 1.5)),
            (Sad, weight(0.8, 0.6, 0.6)),
            (Neutral, weight(1.0, 1.0, 1.0)),
        ]);

        Self {
            patterns,
            expressions,
            weights,
        }
    }
}

// ── Compiled lexicon ───────────────────────────────────

#[derive(Debug)]
pub struct EmotionLexicon {
    patterns: BTreeMap<EmotionCategory, Vec<Regex>>,
    expressions: Vec<JapaneseExpression>,
    weights: BTreeMap<EmotionCategory, VoiceParameterVector>,
}

impl EmotionLexicon {
    pub fn compile(tables: &LexiconTables) -> Result<Self, TtsError> {
        let mut patterns: BTreeMap<EmotionCategory, Vec<Regex>> = BTreeMap::new();
        for set in &tables.patterns {
            let compiled = patterns.entry(set.emotion).or_default();
            for source in &set.patterns {
                let regex = Regex::new(source).map_err(|e| {
                    TtsError::Config(format!(
                        "invalid {} pattern '{}': {}",
                        set.emotion, source, e
                    ))
                })?;
                compiled.push(regex);
            }
        }

        for (emotion, w) in &tables.weights {
            if !w.is_valid() {
                return Err(TtsError::Config(format!(
                    "blend weights for {} must be positive",
                    emotion
                )));
            }
        }

        Ok(Self {
            patterns,
            expressions: tables.expressions.clone(),
            weights: tables.weights.clone(),
        })
    }

    pub fn builtin() -> Self {
        Self::compile(&LexiconTables::default()).expect("built-in lexicon tables are valid")
    }

    /// Compiled patterns per category, in declared category order.
    pub fn patterns(&self) -> impl Iterator<Item = (EmotionCategory, &[Regex])> {
        self.patterns.iter().map(|(e, p)| (*e, p.as_slice()))
    }

    pub fn expressions(&self) -> &[JapaneseExpression] {
        &self.expressions
    }

    /// Blend weight row for a category. Categories without a row blend as neutral.
    pub fn weights(&self, emotion: EmotionCategory) -> VoiceParameterVector {
        self.weights
            .get(&emotion)
            .or_else(|| self.weights.get(&EmotionCategory::Neutral))
            .copied()
            .unwrap_or(VoiceParameterVector::NEUTRAL)
    }
}
