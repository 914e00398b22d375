use super::azure::AzureBackend;
use super::cache::{CacheKey, SynthesisCache};
use super::config::TtsSystemConfig;
use super::interface::{BackendRequest, SpeechBackend, SynthesisRequest, TtsError};
use super::queue::BackendQueue;
use super::ssml::{build_ssml, select_voice, VoiceSelection, DEFAULT_VOICE};
use crate::audio::{
    character_effects, encode, resample, EffectParameters, EffectsChain, OutputFormat, Waveform,
};
use crate::emotion::patterns::{pronunciation_guide, recommend_character};
use crate::emotion::{
    analyze_speech_patterns, blend, Detection, Emotion, EmotionCategory, EmotionClassifier,
    SpeechPatterns,
};
use crate::voice::{
    compose, CharacterProfile, CharacterStore, ParameterOverrides, VoiceCatalog,
    VoiceParameterVector, VoiceSettings, VoiceStyle, VoiceStylePreset,
};

use futures::{Stream, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, warn};

/// Seconds of placeholder audio per input character.
pub const SECONDS_PER_CHAR: f32 = 0.08;
/// Soft cap on streamed chunk length, in characters.
pub const STREAM_CHUNK_CHARS: usize = 100;

pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TtsError>> + Send>>;

// ── Reports ────────────────────────────────────────────

/// Everything resolved for one request before any audio is produced.
#[derive(Debug, Clone)]
pub struct SynthesisPlan {
    pub text: String,
    pub character: CharacterProfile,
    pub requested_emotion: Emotion,
    pub emotion: EmotionCategory,
    pub detection: Option<Detection>,
    pub settings: VoiceSettings,
    pub effects: EffectParameters,
    pub voice: VoiceSelection,
    pub format: OutputFormat,
    pub cache_key: CacheKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    Backend,
    Cache,
    /// Backend missing or failed; placeholder silence.
    Fallback,
}

/// One finished render, shared with requests that joined it.
#[derive(Debug, Clone)]
struct Rendered {
    audio: Vec<u8>,
    source: AudioSource,
    sample_rate: u32,
}

#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub audio: Vec<u8>,
    pub source: AudioSource,
    pub emotion: EmotionCategory,
    pub parameters: VoiceParameterVector,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextAnalysis {
    pub emotions: Detection,
    pub speech_patterns: SpeechPatterns,
    pub pronunciation_guide: Vec<(String, String)>,
    pub recommended_character: String,
    pub estimated_duration: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableVoices {
    pub characters: Vec<String>,
    pub voice_styles: Vec<VoiceStyle>,
    pub emotions: Vec<EmotionCategory>,
    pub backend_voices: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub cache_enabled: bool,
    pub available_characters: usize,
    pub sample_rate: u32,
    pub backend: Option<String>,
    pub backend_available: bool,
}

// ── SynthesisService ───────────────────────────────────

#[derive(Clone)]
pub struct SynthesisService {
    classifier: Arc<EmotionClassifier>,
    catalog: Arc<VoiceCatalog>,
    characters: Arc<RwLock<CharacterStore>>,
    effects: Arc<EffectsChain>,
    backend: Option<Arc<dyn SpeechBackend>>,
    queue: Arc<BackendQueue>,
    cache: Arc<RwLock<SynthesisCache>>,
    config: Arc<TtsSystemConfig>,
    backend_warned: Arc<AtomicBool>,
    /// Renders in progress, so identical concurrent requests share one backend call.
    inflight: Arc<Mutex<HashMap<CacheKey, Arc<OnceCell<Rendered>>>>>,
    registration: Arc<Mutex<()>>,
}

impl SynthesisService {
    /// In-memory service without a backend: every request degrades to silence
    /// until a backend is attached with [`SynthesisService::with_backend`].
    pub fn new(config: TtsSystemConfig) -> Self {
        let sample_rate = config.output_sample_rate();
        Self {
            classifier: Arc::new(EmotionClassifier::default()),
            catalog: Arc::new(VoiceCatalog::default()),
            characters: Arc::new(RwLock::new(CharacterStore::new(&config.default_character))),
            effects: Arc::new(EffectsChain::new(sample_rate, config.effects)),
            backend: None,
            queue: Arc::new(BackendQueue::new(config.queue.max_concurrent)),
            cache: Arc::new(RwLock::new(SynthesisCache::new(config.cache.max_entries))),
            config: Arc::new(config),
            backend_warned: Arc::new(AtomicBool::new(false)),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            registration: Arc::new(Mutex::new(())),
        }
    }

    /// Build the service from config: persisted characters from the data
    /// directory and the configured backend, if its credentials resolve.
    pub fn init_from_config(config: &TtsSystemConfig) -> Self {
        let data_dir = config.resolved_data_dir();
        let store = CharacterStore::new(&config.default_character).with_data_dir(&data_dir);
        let service = Self::new(config.clone()).with_character_store(store);

        match Self::build_backend(config) {
            Some(backend) => {
                info!("[TTS] Registering backend: {}", backend.id());
                service.with_backend(backend)
            }
            None => service,
        }
    }

    fn build_backend(config: &TtsSystemConfig) -> Option<Arc<dyn SpeechBackend>> {
        match config.backend.provider_type.as_str() {
            "azure" => AzureBackend::from_config(&config.backend)
                .map(|b| Arc::new(b) as Arc<dyn SpeechBackend>),
            "none" => None,
            other => {
                warn!("[TTS] Unknown backend type: {}", other);
                None
            }
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn SpeechBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_effects(mut self, chain: EffectsChain) -> Self {
        self.effects = Arc::new(chain);
        self
    }

    pub fn with_character_store(mut self, store: CharacterStore) -> Self {
        self.characters = Arc::new(RwLock::new(store));
        self
    }

    pub fn config(&self) -> &TtsSystemConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.effects.sample_rate()
    }

    // ── Analysis ───────────────────────────────────────

    pub fn detect(&self, text: &str) -> Detection {
        self.classifier.detect(text)
    }

    /// Planning report: emotions, speech patterns, pronunciation and a character suggestion.
    pub fn analyze_text(&self, text: &str) -> TextAnalysis {
        let emotions = self.classifier.detect(text);
        let recommended = recommend_character(emotions.primary_emotion).to_string();
        TextAnalysis {
            speech_patterns: analyze_speech_patterns(text),
            pronunciation_guide: pronunciation_guide(self.classifier.lexicon(), text),
            recommended_character: recommended,
            estimated_duration: text.chars().count() as f32 * SECONDS_PER_CHAR,
            emotions,
        }
    }

    /// Validate the request and resolve every parameter. Rejections happen here.
    pub async fn plan(&self, request: &SynthesisRequest) -> Result<SynthesisPlan, TtsError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let format: OutputFormat = request
            .output_format
            .as_deref()
            .unwrap_or(&self.config.output_format)
            .parse()?;

        let overrides = ParameterOverrides {
            pitch: request.pitch,
            speaking_rate: request.speed,
            energy: request.energy,
        };
        overrides.validate()?;

        let character_id = request
            .character
            .as_deref()
            .unwrap_or(&self.config.default_character);
        let character = {
            let store = self.characters.read().await;
            store.get(character_id).clone()
        };

        let requested_emotion = Emotion::parse(
            request
                .emotion
                .as_deref()
                .unwrap_or(&self.config.default_emotion),
        );
        let (emotion, modifier, detection) = match requested_emotion {
            Emotion::Auto => {
                let detection = self.classifier.detect(text);
                let modifier = blend(&detection.all_emotions, |e| self.catalog.emotion_modifier(e));
                (detection.primary_emotion, modifier, Some(detection))
            }
            Emotion::Explicit(category) => {
                (category, self.catalog.emotion_modifier(category), None)
            }
        };

        let style_name = match request.voice_style.as_deref() {
            Some(label) => label.parse::<VoiceStyle>().unwrap_or_else(|e| {
                debug!("[TTS] {}, using {}", e, character.voice_style);
                character.voice_style
            }),
            None => character.voice_style,
        };
        let style = self.catalog.style(style_name);
        let settings = compose(&character, &modifier, style_name, &style, &overrides);

        let mut effects =
            style_effects(&style).overlay(&character_effects(&character.id, emotion));
        let p = settings.parameters;
        effects.pitch_shift = Some(effects.pitch_shift.unwrap_or(0.0) + (p.pitch - 1.0) * 0.5);
        effects.energy_boost = Some(effects.energy_boost.unwrap_or(0.0) + (p.energy - 1.0) * 0.3);

        let default_voice = self
            .config
            .backend
            .default_voice
            .as_deref()
            .unwrap_or(DEFAULT_VOICE);
        let voice = select_voice(&character, emotion, default_voice);

        let cache_key = CacheKey::new(
            text,
            character_id,
            requested_emotion.label(),
            style_name.as_str(),
            request.speed,
            request.pitch,
            request.energy,
            format,
        );

        Ok(SynthesisPlan {
            text: text.to_string(),
            character,
            requested_emotion,
            emotion,
            detection,
            settings,
            effects,
            voice,
            format,
            cache_key,
        })
    }

    // ── Synthesis ──────────────────────────────────────

    /// Synthesize one request into a finished audio container.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        self.synthesize_with_report(request).await.map(|out| out.audio)
    }

    /// Main pipeline: validate → cache → backend → effects → encode → cache.
    ///
    /// Only malformed requests return `Err`; backend and effect failures
    /// degrade to silence or to skipped stages. Identical requests that
    /// arrive while one is rendering wait for it instead of calling the
    /// backend again.
    pub async fn synthesize_with_report(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput, TtsError> {
        let plan = self.plan(request).await?;

        if let Some(audio) = self.cached(&plan).await {
            return Ok(SynthesisOutput {
                audio,
                source: AudioSource::Cache,
                emotion: plan.emotion,
                parameters: plan.settings.parameters,
                sample_rate: self.sample_rate(),
            });
        }

        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(plan.cache_key.clone()).or_default().clone()
        };
        let led = AtomicBool::new(false);
        let result = cell
            .get_or_try_init(|| async {
                led.store(true, Ordering::Relaxed);
                self.render(&plan).await
            })
            .await
            .cloned();

        {
            let mut inflight = self.inflight.lock().await;
            if inflight
                .get(&plan.cache_key)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                inflight.remove(&plan.cache_key);
            }
        }

        let rendered = result?;
        let source = match rendered.source {
            AudioSource::Backend if !led.load(Ordering::Relaxed) => {
                debug!("[TTS] Joined in-flight render: {}", preview(&plan.text));
                AudioSource::Cache
            }
            source => source,
        };

        Ok(SynthesisOutput {
            audio: rendered.audio,
            source,
            emotion: plan.emotion,
            parameters: plan.settings.parameters,
            sample_rate: rendered.sample_rate,
        })
    }

    async fn cached(&self, plan: &SynthesisPlan) -> Option<Vec<u8>> {
        if !self.config.cache.enabled {
            return None;
        }
        let audio = self.cache.read().await.get(&plan.cache_key)?;
        debug!("[TTS] Cache hit: {}", preview(&plan.text));
        Some(audio)
    }

    /// Backend (or silence) → effects → encode, caching backend audio.
    async fn render(&self, plan: &SynthesisPlan) -> Result<Rendered, TtsError> {
        // A render that finished between our cache miss and taking the slot.
        if let Some(audio) = self.cached(plan).await {
            return Ok(Rendered {
                audio,
                source: AudioSource::Cache,
                sample_rate: self.sample_rate(),
            });
        }

        let (waveform, source) = match self.call_backend(plan).await {
            Some(raw) => (self.post_process(raw, plan), AudioSource::Backend),
            None => {
                let duration = plan.text.chars().count() as f32 * SECONDS_PER_CHAR;
                (
                    Waveform::silence(duration, self.sample_rate()),
                    AudioSource::Fallback,
                )
            }
        };

        let audio = encode(&waveform, plan.format)?;

        if self.config.cache.enabled && source == AudioSource::Backend {
            let mut cache = self.cache.write().await;
            cache.put(plan.cache_key.clone(), audio.clone());
        }

        info!(
            "[TTS] Synthesized {} ({}, {}): {}",
            plan.character.id,
            plan.emotion,
            match source {
                AudioSource::Backend => "backend",
                AudioSource::Cache => "cache",
                AudioSource::Fallback => "fallback",
            },
            preview(&plan.text)
        );

        Ok(Rendered {
            audio,
            source,
            sample_rate: waveform.sample_rate,
        })
    }

    /// Lazy per-sentence synthesis. Chunks come out in text order, one backend
    /// call at a time; dropping the stream stops further work.
    pub async fn synthesize_stream(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, TtsError> {
        // Reject malformed requests before the first chunk.
        self.plan(request).await?;

        let chunks = split_sentences(&request.text);
        let service = self.clone();
        let base = request.clone();
        let stream = futures::stream::iter(chunks).then(move |chunk| {
            let service = service.clone();
            let request = SynthesisRequest {
                text: chunk,
                ..base.clone()
            };
            async move { service.synthesize(&request).await }
        });
        Ok(Box::pin(stream))
    }

    /// Returns `None` when the caller should fall back to silence.
    async fn call_backend(&self, plan: &SynthesisPlan) -> Option<Waveform> {
        let Some(backend) = self.backend.as_ref() else {
            self.warn_backend_once("no speech backend configured");
            return None;
        };
        if !backend.is_available().await {
            self.warn_backend_once(&format!("backend '{}' is not available", backend.id()));
            return None;
        }

        let request = BackendRequest {
            text: plan.text.clone(),
            voice_id: plan.voice.voice_id.clone(),
            style: plan.voice.style.clone(),
            parameters: plan.settings.parameters,
            markup: build_ssml(&plan.text, &plan.voice, &plan.settings.parameters),
        };

        match self.queue.run(backend.synthesize_raw(&request)).await {
            Ok(waveform) if !waveform.is_empty() => Some(waveform),
            Ok(_) => {
                warn!("[TTS] Backend returned no audio, using silence");
                None
            }
            Err(TtsError::Unavailable(msg)) => {
                self.warn_backend_once(&msg);
                None
            }
            Err(e) => {
                warn!("[TTS] Backend synthesis failed, using silence: {}", e);
                None
            }
        }
    }

    fn warn_backend_once(&self, reason: &str) {
        if !self.backend_warned.swap(true, Ordering::SeqCst) {
            warn!("[TTS] {}; synthesizing silent placeholders", reason);
        }
    }

    fn post_process(&self, raw: Waveform, plan: &SynthesisPlan) -> Waveform {
        let target = self.sample_rate();
        let mut waveform = raw;

        if waveform.sample_rate != target {
            if self.effects.capabilities().resampling {
                match resample(&waveform.samples, waveform.sample_rate, target) {
                    Ok(samples) => waveform = Waveform::new(samples, target),
                    Err(e) => warn!("[TTS] Resampling backend audio failed: {}", e),
                }
            } else {
                debug!(
                    "[TTS] Resampling unavailable, keeping backend rate {}",
                    waveform.sample_rate
                );
            }
        }

        let samples = self.effects.apply(&waveform.samples, &plan.effects);
        Waveform::new(samples, waveform.sample_rate)
    }

    // ── Characters ─────────────────────────────────────

    pub async fn get_character(&self, id: &str) -> CharacterProfile {
        self.characters.read().await.get(id).clone()
    }

    /// Register or overwrite a character. Cached audio is dropped since it
    /// may have been rendered with the old profile.
    pub async fn register_character(
        &self,
        id: &str,
        profile: CharacterProfile,
    ) -> Result<(), TtsError> {
        // Registrations are serialized so each one writes an index that
        // includes every earlier entry. Reads only wait for the final commit.
        let _guard = self.registration.lock().await;
        let pending = self.characters.read().await.prepare(id, profile)?;
        for (path, contents) in &pending.documents {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, contents).await?;
            debug!("[Voice] Wrote {}", path.display());
        }
        self.characters.write().await.commit(pending);
        self.clear_cache().await;
        Ok(())
    }

    /// Register from an untyped document, e.g. a user-supplied JSON config.
    pub async fn register_character_value(
        &self,
        id: &str,
        value: serde_json::Value,
    ) -> Result<(), TtsError> {
        let profile = CharacterProfile::from_value(id, value)?;
        self.register_character(id, profile).await
    }

    // ── Query methods ──────────────────────────────────

    pub async fn list_characters(&self) -> Vec<String> {
        let store = self.characters.read().await;
        store.list().into_iter().map(|c| c.id.clone()).collect()
    }

    pub fn list_voice_styles(&self) -> Vec<VoiceStyle> {
        self.catalog.list_styles()
    }

    pub fn list_emotions(&self) -> Vec<EmotionCategory> {
        EmotionCategory::ALL.to_vec()
    }

    pub async fn available_voices(&self) -> AvailableVoices {
        AvailableVoices {
            characters: self.list_characters().await,
            voice_styles: self.list_voice_styles(),
            emotions: self.list_emotions(),
            backend_voices: self
                .backend
                .as_ref()
                .map(|b| b.voices())
                .unwrap_or_default(),
        }
    }

    pub async fn stats(&self) -> ServiceStats {
        let (cache_size, cache_capacity) = {
            let cache = self.cache.read().await;
            (cache.len(), cache.capacity())
        };
        let backend_available = match &self.backend {
            Some(b) => b.is_available().await,
            None => false,
        };
        ServiceStats {
            cache_size,
            cache_capacity,
            cache_enabled: self.config.cache.enabled,
            available_characters: self.characters.read().await.len(),
            sample_rate: self.sample_rate(),
            backend: self.backend.as_ref().map(|b| b.id()),
            backend_available,
        }
    }

    /// Clear the synthesis cache.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        debug!("[TTS] Synthesis cache cleared");
    }
}

/// Base effect layer from the voice style: its breathiness and vibrato
/// become noise and pitch variation unless the character or emotion set them.
fn style_effects(style: &VoiceStylePreset) -> EffectParameters {
    EffectParameters {
        formant_shift: Some(style.formant_shift),
        breathiness: Some(style.breathiness),
        pitch_variation: Some(style.vibrato),
        ..Default::default()
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        out.push_str("...");
    }
    out
}

/// Split on sentence terminators (runs of `.`, `!`, `?` stay with their
/// sentence), then merge neighbours while the chunk stays within
/// [`STREAM_CHUNK_CHARS`]. A single longer sentence becomes its own chunk.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?')
            && !matches!(chars.peek(), Some('.') | Some('!') | Some('?'))
        {
            sentences.push(std::mem::take(&mut current));
        }
    }
    sentences.push(current);

    let mut chunks: Vec<String> = Vec::new();
    let mut chunk = String::new();
    for sentence in sentences {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let len = chunk.chars().count();
        if len > 0 && len + 1 + sentence.chars().count() > STREAM_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut chunk));
        }
        if !chunk.is_empty() {
            chunk.push(' ');
        }
        chunk.push_str(sentence);
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}
