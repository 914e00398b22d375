pub mod category;
pub mod classifier;
pub mod lexicon;
pub mod patterns;
pub mod sentiment;

pub use category::{Emotion, EmotionCategory};
pub use classifier::{blend, Detection, EmotionClassifier, EmotionScore};
pub use lexicon::{EmotionLexicon, JapaneseExpression, LexiconTables};
pub use patterns::{analyze_speech_patterns, SpeechPatterns, SpeechRhythm};
