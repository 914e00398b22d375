//! Rule-based emotion classifier.
//!
//! Scores text against the lexicon patterns and Japanese expressions, falls
//! back to keyword polarity when nothing fires, and blends the blend-weight
//! rows of every detected emotion in proportion to their scores.

use super::category::EmotionCategory;
use super::lexicon::EmotionLexicon;
use super::sentiment;
use crate::voice::VoiceParameterVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Base weight of the first Japanese expression hit for an emotion.
const EXPRESSION_BASE_SCORE: f32 = 2.0;
/// Added per expression occurrence, including the first.
const EXPRESSION_HIT_SCORE: f32 = 1.0;
/// |polarity| needed before the fallback leaves neutral.
const POLARITY_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: EmotionCategory,
    pub score: f32,
    pub matched_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub primary_emotion: EmotionCategory,
    pub all_emotions: BTreeMap<EmotionCategory, EmotionScore>,
    pub parameters: VoiceParameterVector,
    /// Raw score of the primary emotion. A relative magnitude, not a probability.
    pub confidence: f32,
}

pub struct EmotionClassifier {
    lexicon: Arc<EmotionLexicon>,
}

impl EmotionClassifier {
    pub fn new(lexicon: Arc<EmotionLexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &EmotionLexicon {
        &self.lexicon
    }

    pub fn detect(&self, text: &str) -> Detection {
        let lower = text.to_lowercase();
        let mut scores: BTreeMap<EmotionCategory, EmotionScore> = BTreeMap::new();

        for (emotion, patterns) in self.lexicon.patterns() {
            for pattern in patterns {
                for m in pattern.find_iter(&lower) {
                    let entry = scores.entry(emotion).or_insert_with(|| empty_score(emotion));
                    entry.score += 1.0;
                    entry.matched_terms.push(m.as_str().to_string());
                }
            }
        }

        self.score_expressions(&lower, &mut scores);

        if scores.is_empty() {
            let polarity = sentiment::analyze(text).value;
            let (emotion, score) = if polarity > POLARITY_THRESHOLD {
                (EmotionCategory::Cheerful, polarity)
            } else if polarity < -POLARITY_THRESHOLD {
                (EmotionCategory::Sad, polarity.abs())
            } else {
                (EmotionCategory::Neutral, 1.0)
            };
            scores.insert(
                emotion,
                EmotionScore {
                    emotion,
                    score,
                    matched_terms: Vec::new(),
                },
            );
        }

        // BTreeMap iterates in declared category order; strict `>` keeps the
        // first category on ties.
        let mut primary = EmotionCategory::Neutral;
        let mut best = f32::NEG_INFINITY;
        for (emotion, entry) in &scores {
            if entry.score > best {
                best = entry.score;
                primary = *emotion;
            }
        }

        let parameters = blend(&scores, |e| self.lexicon.weights(e));

        Detection {
            primary_emotion: primary,
            confidence: best,
            all_emotions: scores,
            parameters,
        }
    }

    fn score_expressions(&self, lower: &str, scores: &mut BTreeMap<EmotionCategory, EmotionScore>) {
        let mut seen: BTreeMap<EmotionCategory, bool> = BTreeMap::new();
        for expr in self.lexicon.expressions() {
            let mut hits = lower.matches(expr.romanized.as_str()).count();
            if let Some(native) = &expr.native {
                hits += lower.matches(native.as_str()).count();
            }
            if hits == 0 {
                continue;
            }

            let entry = scores
                .entry(expr.emotion)
                .or_insert_with(|| empty_score(expr.emotion));
            if !seen.contains_key(&expr.emotion) {
                entry.score += EXPRESSION_BASE_SCORE;
                seen.insert(expr.emotion, true);
            }
            entry.score += EXPRESSION_HIT_SCORE * hits as f32;
            for _ in 0..hits {
                entry.matched_terms.push(expr.romanized.clone());
            }
        }
    }
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::new(Arc::new(EmotionLexicon::builtin()))
    }
}

fn empty_score(emotion: EmotionCategory) -> EmotionScore {
    EmotionScore {
        emotion,
        score: 0.0,
        matched_terms: Vec::new(),
    }
}

/// Blend a per-emotion table by relative score.
///
/// A single detected emotion returns its row verbatim. Otherwise each row is
/// weighted by `score / total`, so the weights sum to one.
pub fn blend<F>(scores: &BTreeMap<EmotionCategory, EmotionScore>, table: F) -> VoiceParameterVector
where
    F: Fn(EmotionCategory) -> VoiceParameterVector,
{
    if scores.len() == 1 {
        if let Some(emotion) = scores.keys().next() {
            return table(*emotion);
        }
    }

    let total: f32 = scores.values().map(|s| s.score).sum();
    if scores.is_empty() || total <= 0.0 {
        return table(EmotionCategory::Neutral);
    }

    let mut blended = VoiceParameterVector {
        pitch: 0.0,
        speaking_rate: 0.0,
        energy: 0.0,
    };
    for (emotion, entry) in scores {
        let weight = entry.score / total;
        let row = table(*emotion);
        blended.pitch += row.pitch * weight;
        blended.speaking_rate += row.speaking_rate * weight;
        blended.energy += row.energy * weight;
    }
    blended
}
