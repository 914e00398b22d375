use crate::audio::{OutputFormat, Waveform};
use crate::voice::VoiceParameterVector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Text is empty")]
    EmptyText,
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid character profile: {0}")]
    InvalidProfile(String),
    #[error("TTS backend unavailable: {0}")]
    Unavailable(String),
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("Effect failed: {0}")]
    Effect(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TtsError {
    /// Errors that reject a request outright instead of degrading.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TtsError::EmptyText | TtsError::UnsupportedFormat(_) | TtsError::InvalidParameter(_)
        )
    }
}

// For command-style callers that want plain strings
impl From<TtsError> for String {
    fn from(e: TtsError) -> String {
        e.to_string()
    }
}

// ── Requests ───────────────────────────────────────────

/// One synthesis call as received from a caller.
///
/// Unset fields fall back to the service defaults. `emotion` takes a
/// category label or `"auto"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub voice_style: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub pitch: Option<f32>,
    #[serde(default)]
    pub energy: Option<f32>,
    #[serde(default)]
    pub output_format: Option<String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn character(mut self, id: impl Into<String>) -> Self {
        self.character = Some(id.into());
        self
    }

    pub fn emotion(mut self, label: impl Into<String>) -> Self {
        self.emotion = Some(label.into());
        self
    }

    pub fn voice_style(mut self, style: impl Into<String>) -> Self {
        self.voice_style = Some(style.into());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format.as_str().to_string());
        self
    }
}

/// What the backend receives: the marked-up document plus the values it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub text: String,
    pub voice_id: String,
    pub style: String,
    pub parameters: VoiceParameterVector,
    pub markup: String,
}

// ── Backend Trait ──────────────────────────────────────

/// External neural TTS engine, treated as an opaque waveform source.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Unique identifier for this backend (e.g., "azure")
    fn id(&self) -> String;

    /// Voice identifiers this backend can speak with.
    fn voices(&self) -> Vec<String> {
        Vec::new()
    }

    /// Check if the backend is currently reachable / operational
    async fn is_available(&self) -> bool;

    async fn synthesize_raw(&self, request: &BackendRequest) -> Result<Waveform, TtsError>;
}
