//! Keyword polarity — the fallback signal when no lexicon pattern fires.
//!
//! Fast and dictionary-based: counts distinct positive and negative keywords
//! and folds them into a polarity in (-1.0, 1.0).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polarity {
    /// -1.0 (very negative) ..= 1.0 (very positive); 0.0 when no keyword hits.
    pub value: f32,
    pub positive_hits: usize,
    pub negative_hits: usize,
}

// ── Keyword sets ───────────────────────────────────────────

const POSITIVE_KW: &[&str] = &[
    // English
    "glad",
    "love",
    "thanks",
    "thank you",
    "excellent",
    "nice",
    "cool",
    "perfect",
    "good",
    "beautiful",
    "lovely",
    "delight",
    "fun",
    "best",
    "enjoy",
    "pleased",
    "cute",
    // Japanese
    "うれしい",
    "たのしい",
    "すてき",
    "だいすき",
    "よかった",
    "daisuki",
    "tanoshii",
    "suteki",
    // Emoji-like
    "😊",
    "😄",
    "😁",
    "❤",
    "💕",
    "👍",
    "🎉",
    "✨",
];

const NEGATIVE_KW: &[&str] = &[
    // English
    "angry",
    "annoyed",
    "frustrated",
    "tired",
    "bored",
    "hate",
    "terrible",
    "awful",
    "bad",
    "worried",
    "anxious",
    "stressed",
    "horrible",
    "lonely",
    "miss you",
    "worst",
    // Japanese
    "かなしい",
    "さびしい",
    "つらい",
    "いや",
    "kanashii",
    "sabishii",
    // Emoji-like
    "😢",
    "😭",
    "😡",
    "😤",
    "💔",
    "😞",
    "😔",
];

/// Score the polarity of `text`.
pub fn analyze(text: &str) -> Polarity {
    let lower = text.to_lowercase();

    let positive_hits = POSITIVE_KW.iter().filter(|kw| lower.contains(*kw)).count();
    let negative_hits = NEGATIVE_KW.iter().filter(|kw| lower.contains(*kw)).count();

    // +1 in the denominator keeps a single keyword from reading as certainty.
    let value = (positive_hits as f32 - negative_hits as f32)
        / (positive_hits + negative_hits + 1) as f32;

    Polarity {
        value,
        positive_hits,
        negative_hits,
    }
}
