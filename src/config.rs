//! JSON documents on disk: the system config file, one document per
//! registered character and the `models.json` index beside them.
//!
//! Config loads are forgiving (defaults on any failure) while character
//! documents go through the strict [`read_json_document`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read and parse one document. Missing and malformed files are both errors.
pub fn read_json_document<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Load a config document, falling back to `T::default()`.
///
/// An absent file is normal (first run) and logged at debug; a file that
/// exists but does not parse is warned about.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    if !path.exists() {
        debug!("[{}] {} not found, using defaults", label, path.display());
        return T::default();
    }
    match read_json_document(path) {
        Ok(config) => {
            info!("[{}] Loaded {}", label, path.display());
            config
        }
        Err(e) => {
            warn!("[{}] {}; using defaults", label, e);
            T::default()
        }
    }
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn save_json_config<T: Serialize>(path: &Path, value: &T, label: &str) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize {}: {}", path.display(), e))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }
    std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    info!("[{}] Saved {}", label, path.display());
    Ok(())
}

/// Backend credential: a non-empty literal key wins, otherwise the named
/// environment variable if it is set and non-empty.
pub fn resolve_api_key(api_key: &Option<String>, api_key_env: &Option<String>) -> Option<String> {
    api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| {
            api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|k| !k.is_empty())
        })
}

/// `<platform data dir>/waifu-voice`, home of character documents and the model index.
pub fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waifu-voice")
}
