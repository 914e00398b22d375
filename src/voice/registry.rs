use super::model_index::{ModelIndex, MODEL_INDEX_FILE};
use super::profile::{builtin_characters, CharacterProfile, DEFAULT_CHARACTER};
use crate::config::read_json_document;
use crate::tts::TtsError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Registry of character profiles, seeded with the built-in characters.
///
/// Lookups never fail: unknown ids resolve to the default character.
/// Registration is last-write-wins and, when a data directory is attached,
/// persists one JSON document per character plus the model index.
/// Thread safety is handled at the service level via `Arc<RwLock<CharacterStore>>`.
pub struct CharacterStore {
    characters: HashMap<String, CharacterProfile>,
    default_id: String,
    data_dir: Option<PathBuf>,
    index: ModelIndex,
}

/// A validated registration whose documents still have to be written.
#[derive(Debug)]
pub struct PendingRegistration {
    profile: CharacterProfile,
    index: ModelIndex,
    /// `(path, JSON)` pairs, character document first.
    pub documents: Vec<(PathBuf, String)>,
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<String, TtsError> {
    serde_json::to_string_pretty(value).map_err(|e| TtsError::Config(e.to_string()))
}

pub fn character_file_name(id: &str) -> String {
    format!("character_{}.json", id)
}

impl CharacterStore {
    pub fn new(default_id: &str) -> Self {
        let mut characters = HashMap::new();
        for profile in builtin_characters() {
            characters.insert(profile.id.clone(), profile);
        }

        let default_id = if characters.contains_key(default_id) {
            default_id.to_string()
        } else {
            warn!(
                "[Voice] Default character '{}' is not built in, using '{}'",
                default_id, DEFAULT_CHARACTER
            );
            DEFAULT_CHARACTER.to_string()
        };

        Self {
            characters,
            default_id,
            data_dir: None,
            index: ModelIndex::default(),
        }
    }

    /// Attach a data directory and load every character document listed in its model index.
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.index = ModelIndex::load(dir);
        for entry in &self.index.models {
            let path = dir.join(&entry.config_file);
            let loaded = read_json_document::<serde_json::Value>(&path)
                .map_err(TtsError::Config)
                .and_then(|value| CharacterProfile::from_value(&entry.voice_id, value));
            match loaded {
                Ok(profile) => {
                    info!("[Voice] Loaded character '{}'", profile.id);
                    self.characters.insert(profile.id.clone(), profile);
                }
                Err(e) => warn!("[Voice] Skipping character '{}': {}", entry.voice_id, e),
            }
        }
        self.data_dir = Some(dir.to_path_buf());
        self
    }

    /// Get a character by ID, falling back to the default character.
    pub fn get(&self, id: &str) -> &CharacterProfile {
        self.characters
            .get(id)
            .or_else(|| self.characters.get(&self.default_id))
            .expect("default character is always registered")
    }

    pub fn contains(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }

    /// Register (or overwrite) a character profile.
    ///
    /// The profile is validated and persisted before it becomes visible; a
    /// failed write leaves the registry unchanged.
    pub fn register(&mut self, id: &str, profile: CharacterProfile) -> Result<(), TtsError> {
        let pending = self.prepare(id, profile)?;
        for (path, contents) in &pending.documents {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        self.commit(pending);
        Ok(())
    }

    /// Validate a profile and serialize the documents it needs on disk,
    /// without touching the registry or the filesystem.
    pub fn prepare(
        &self,
        id: &str,
        mut profile: CharacterProfile,
    ) -> Result<PendingRegistration, TtsError> {
        profile.id = id.to_string();
        profile.validate()?;

        let mut index = self.index.clone();
        let mut documents = Vec::new();
        if let Some(dir) = &self.data_dir {
            let file_name = character_file_name(id);
            index.upsert(id, &file_name);
            documents.push((dir.join(&file_name), to_document(&profile)?));
            documents.push((dir.join(MODEL_INDEX_FILE), to_document(&index)?));
        }

        Ok(PendingRegistration {
            profile,
            index,
            documents,
        })
    }

    /// Make a prepared profile visible. Its documents must already be written.
    pub fn commit(&mut self, pending: PendingRegistration) {
        let PendingRegistration { profile, index, .. } = pending;
        info!("[Voice] Registered character '{}'", profile.id);
        self.index = index;
        self.characters.insert(profile.id.clone(), profile);
    }

    /// List all registered characters, sorted by id.
    pub fn list(&self) -> Vec<&CharacterProfile> {
        let mut all: Vec<&CharacterProfile> = self.characters.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
