use crate::audio::EffectCapabilities;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

// ── Quality ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    pub fn sample_rate(&self) -> u32 {
        match self {
            Quality::Low => 16000,
            Quality::Medium => 22050,
            Quality::High => 44100,
        }
    }
}

// ── Backend Config ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// "azure" or "none"
    #[serde(default = "default_provider_type")]
    pub provider_type: String,
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Full endpoint URL; derived from `region` when absent.
    pub endpoint: Option<String>,
    #[serde(default = "default_backend_format")]
    pub output_format: String,
    pub default_voice: Option<String>,
}

impl BackendConfig {
    /// Resolve the API key: check `api_key` field first, then `api_key_env` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        crate::config::resolve_api_key(&self.api_key, &self.api_key_env)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            api_key: None,
            api_key_env: default_api_key_env(),
            region: default_region(),
            endpoint: None,
            output_format: default_backend_format(),
            default_voice: None,
        }
    }
}

fn default_provider_type() -> String {
    "azure".to_string()
}
fn default_api_key_env() -> Option<String> {
    Some("AZURE_SPEECH_KEY".to_string())
}
fn default_region() -> String {
    "eastus".to_string()
}
fn default_backend_format() -> String {
    "riff-24khz-16bit-mono-pcm".to_string()
}

// ── Cache Config ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100,
        }
    }
}

fn default_max_entries() -> usize {
    100
}

// ── Queue Config ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrent: 3 }
    }
}

fn default_max_concurrent() -> usize {
    3
}

// ── Top-Level System Config ────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSystemConfig {
    #[serde(default)]
    pub quality: Quality,
    /// Explicit output rate; overrides `quality` when set.
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default = "default_character")]
    pub default_character: String,
    #[serde(default = "default_emotion")]
    pub default_emotion: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub effects: EffectCapabilities,
    /// Character documents and model index; platform data dir when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for TtsSystemConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            sample_rate: None,
            default_character: default_character(),
            default_emotion: default_emotion(),
            output_format: default_output_format(),
            cache: CacheConfig::default(),
            queue: QueueConfig::default(),
            backend: BackendConfig::default(),
            effects: EffectCapabilities::default(),
            data_dir: None,
        }
    }
}

impl TtsSystemConfig {
    pub fn output_sample_rate(&self) -> u32 {
        self.sample_rate
            .filter(|r| *r > 0)
            .unwrap_or_else(|| self.quality.sample_rate())
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(crate::config::default_data_dir)
    }
}

fn default_character() -> String {
    crate::voice::DEFAULT_CHARACTER.to_string()
}
fn default_emotion() -> String {
    "cheerful".to_string()
}
fn default_output_format() -> String {
    "wav".to_string()
}

/// Load TTS config from a JSON file. Falls back to defaults if file is missing or invalid.
pub fn load_config(path: &Path) -> TtsSystemConfig {
    crate::config::load_json_config(path, "TTS")
}

/// Save TTS config to a JSON file.
pub fn save_config(path: &Path, config: &TtsSystemConfig) -> Result<(), String> {
    crate::config::save_json_config(path, config, "TTS")
}
