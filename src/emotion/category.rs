use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emotion categories understood by the classifier and the voice tables.
///
/// Declaration order is significant: it is the iteration order used for
/// scoring and the tie-break order when two categories share the top score
/// (the earlier category wins). The derived `Ord` follows the same order, so
/// `BTreeMap<EmotionCategory, _>` iterates in it too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionCategory {
    Cheerful,
    Giggly,
    Teasing,
    Shy,
    Excited,
    Sad,
    Neutral,
    Angry,
    Surprised,
}

impl EmotionCategory {
    pub const ALL: [EmotionCategory; 9] = [
        EmotionCategory::Cheerful,
        EmotionCategory::Giggly,
        EmotionCategory::Teasing,
        EmotionCategory::Shy,
        EmotionCategory::Excited,
        EmotionCategory::Sad,
        EmotionCategory::Neutral,
        EmotionCategory::Angry,
        EmotionCategory::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionCategory::Cheerful => "cheerful",
            EmotionCategory::Giggly => "giggly",
            EmotionCategory::Teasing => "teasing",
            EmotionCategory::Shy => "shy",
            EmotionCategory::Excited => "excited",
            EmotionCategory::Sad => "sad",
            EmotionCategory::Neutral => "neutral",
            EmotionCategory::Angry => "angry",
            EmotionCategory::Surprised => "surprised",
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        EmotionCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown emotion: {}", s))
    }
}

/// Requested emotion for a synthesis call: inferred from the text, or fixed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Auto,
    Explicit(EmotionCategory),
}

impl Emotion {
    /// Parse a request label. `"auto"` selects inference; unknown labels speak neutrally.
    pub fn parse(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("auto") {
            return Emotion::Auto;
        }
        match label.parse::<EmotionCategory>() {
            Ok(category) => Emotion::Explicit(category),
            Err(_) => {
                tracing::debug!("[Emotion] Unknown emotion '{}', using neutral", label);
                Emotion::Explicit(EmotionCategory::Neutral)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Auto => "auto",
            Emotion::Explicit(category) => category.as_str(),
        }
    }
}
