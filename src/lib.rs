//! Emotion-aware anime character voice synthesis.
//!
//! Text is classified into an emotion, combined with a character profile
//! into voice parameters, rendered by an external speech backend and
//! shaped by a chain of waveform effects.

pub mod audio;
pub mod config;
pub mod emotion;
pub mod tts;
pub mod voice;
