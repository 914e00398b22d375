pub mod compositor;
pub mod model_index;
pub mod params;
pub mod profile;
pub mod registry;

pub use compositor::{compose, VoiceSettings};
pub use model_index::{ModelEntry, ModelIndex};
pub use params::{ParameterOverrides, VoiceParameterVector};
pub use profile::{
    builtin_characters, CharacterProfile, VoiceCatalog, VoiceStyle, VoiceStylePreset,
    DEFAULT_CHARACTER,
};
pub use registry::{CharacterStore, PendingRegistration};
