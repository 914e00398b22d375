pub mod azure;
pub mod cache;
pub mod config;
pub mod interface;
pub mod manager;
pub mod queue;
pub mod ssml;

#[cfg(test)]
mod tests;

pub use config::{load_config, save_config, Quality, TtsSystemConfig};
pub use interface::{BackendRequest, SpeechBackend, SynthesisRequest, TtsError};
pub use manager::{
    split_sentences, AudioSource, AudioStream, AvailableVoices, ServiceStats, SynthesisOutput,
    SynthesisPlan, SynthesisService, TextAnalysis,
};
