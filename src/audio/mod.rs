pub mod effects;
pub mod presets;
pub mod resample;
pub mod wav;

pub use effects::{audio_info, AudioInfo, EffectCapabilities, EffectParameters, EffectsChain};
pub use presets::{character_effects, emotion_overlay, EffectPreset};
pub use resample::resample;
pub use wav::{decode_wav, encode, OutputFormat, Waveform};
