use crate::config::{load_json_config, save_json_config};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MODEL_INDEX_FILE: &str = "models.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub voice_id: String,
    pub config_file: String,
}

/// Index document listing the available voices and their config documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelIndex {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ModelIndex {
    pub fn load(dir: &Path) -> Self {
        load_json_config(&dir.join(MODEL_INDEX_FILE), "Models")
    }

    pub fn save(&self, dir: &Path) -> Result<(), String> {
        save_json_config(&dir.join(MODEL_INDEX_FILE), self, "Models")
    }

    /// Insert or replace the entry for `voice_id`.
    pub fn upsert(&mut self, voice_id: &str, config_file: &str) {
        match self.models.iter_mut().find(|m| m.voice_id == voice_id) {
            Some(entry) => entry.config_file = config_file.to_string(),
            None => self.models.push(ModelEntry {
                voice_id: voice_id.to_string(),
                config_file: config_file.to_string(),
            }),
        }
    }

    pub fn voice_ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.voice_id.as_str()).collect()
    }
}
