use crate::audio::{EffectCapabilities, EffectsChain, Waveform};
use crate::tts::{BackendRequest, SpeechBackend, SynthesisService, TtsError, TtsSystemConfig};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Waveform generators ─────────────────────────────────────

/// Sine tone at `amp` peak amplitude.
pub fn sine(freq: f32, sample_rate: u32, secs: f32, amp: f32) -> Waveform {
    let len = (sample_rate as f32 * secs) as usize;
    let samples = (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * amp)
        .collect();
    Waveform::new(samples, sample_rate)
}

// ── Mock backend ────────────────────────────────────────────

pub enum MockMode {
    Tone,
    Fail,
    Unavailable,
}

/// Backend that counts calls and records every request it sees.
pub struct CountingBackend {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<BackendRequest>>,
    pub sample_rate: u32,
    mode: MockMode,
    delay: Option<Duration>,
}

impl CountingBackend {
    pub fn new(mode: MockMode) -> Arc<Self> {
        Self::with_rate(mode, 22050)
    }

    pub fn with_rate(mode: MockMode, sample_rate: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            sample_rate,
            mode,
            delay: None,
        })
    }

    /// Tone backend that takes `delay` to answer each call.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            sample_rate: 22050,
            mode: MockMode::Tone,
            delay: Some(delay),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SpeechBackend for CountingBackend {
    fn id(&self) -> String {
        "mock".to_string()
    }

    fn voices(&self) -> Vec<String> {
        vec!["mock-voice".to_string()]
    }

    async fn is_available(&self) -> bool {
        !matches!(self.mode, MockMode::Unavailable)
    }

    async fn synthesize_raw(&self, request: &BackendRequest) -> Result<Waveform, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.mode {
            MockMode::Tone => Ok(sine(220.0, self.sample_rate, 0.25, 0.4)),
            MockMode::Fail => Err(TtsError::SynthesisFailed("mock failure".into())),
            MockMode::Unavailable => Err(TtsError::Unavailable("mock offline".into())),
        }
    }
}

// ── Service setup helpers ───────────────────────────────────

/// Service with a seeded effects chain and the given backend.
pub fn service_with(backend: Arc<CountingBackend>) -> SynthesisService {
    let config = TtsSystemConfig::default();
    let chain = EffectsChain::new(config.output_sample_rate(), EffectCapabilities::default())
        .with_seed(42);
    SynthesisService::new(config)
        .with_effects(chain)
        .with_backend(backend)
}

/// Service with no backend at all.
pub fn offline_service() -> SynthesisService {
    SynthesisService::new(TtsSystemConfig::default())
}
