use super::config::BackendConfig;
use super::interface::{BackendRequest, SpeechBackend, TtsError};
use super::ssml::{character_voice, DEFAULT_VOICE};
use crate::audio::{decode_wav, Waveform};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Azure Cognitive Services speech backend.
///
/// Posts the SSML document with `Ocp-Apim-Subscription-Key` auth and
/// decodes the returned RIFF container.
pub struct AzureBackend {
    client: Client,
    api_key: String,
    endpoint: String,
    output_format: String,
    default_voice: String,
}

impl AzureBackend {
    /// Build from config. Returns `None` when no API key can be resolved.
    pub fn from_config(config: &BackendConfig) -> Option<Self> {
        let api_key = config.resolve_api_key()?;
        Some(Self {
            client: Client::new(),
            api_key,
            endpoint: config.endpoint.clone().unwrap_or_else(|| {
                format!(
                    "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                    config.region
                )
            }),
            output_format: config.output_format.clone(),
            default_voice: config
                .default_voice
                .clone()
                .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpeechBackend for AzureBackend {
    fn id(&self) -> String {
        "azure".to_string()
    }

    fn voices(&self) -> Vec<String> {
        let mut voices: Vec<String> = ["sakura", "yuki", "rei", "miku"]
            .iter()
            .filter_map(|c| character_voice(c))
            .map(str::to_string)
            .collect();
        if !voices.contains(&self.default_voice) {
            voices.push(self.default_voice.clone());
        }
        voices
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn synthesize_raw(&self, request: &BackendRequest) -> Result<Waveform, TtsError> {
        debug!(
            "[TTS] Azure request: voice={}, style={}",
            request.voice_id, request.style
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header("User-Agent", "waifu-voice")
            .body(request.markup.clone())
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| TtsError::Unavailable(format!("azure request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::SynthesisFailed(format!(
                "azure API error {}: {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("azure bytes error: {}", e)))?;
        decode_wav(&bytes)
    }
}
