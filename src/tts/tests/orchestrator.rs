use super::helpers::{offline_service, service_with, CountingBackend, MockMode};
use futures::future::join_all;
use std::time::Duration;
use crate::audio::{decode_wav, OutputFormat};
use crate::emotion::EmotionCategory;
use crate::tts::{AudioSource, SynthesisRequest, SynthesisService, TtsError, TtsSystemConfig};
use crate::voice::{CharacterProfile, VoiceStyle};

// ── End-to-end ──────────────────────────────────────────────

#[tokio::test]
async fn test_greeting_scenario_auto_emotion() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend.clone());

    let request = SynthesisRequest::new("Konnichiwa! I'm so happy!")
        .character("sakura")
        .emotion("auto");
    let out = service.synthesize_with_report(&request).await.unwrap();

    assert_eq!(out.source, AudioSource::Backend);
    assert_eq!(out.emotion, EmotionCategory::Cheerful);
    assert!((out.parameters.pitch - 1.32).abs() < 1e-4);
    assert_eq!(&out.audio[0..4], b"RIFF");

    let decoded = decode_wav(&out.audio).unwrap();
    assert_eq!(decoded.sample_rate, 22050);
    assert!(!decoded.samples.is_empty());
    assert!(decoded.samples.iter().all(|s| s.abs() <= 1.0));

    let sent = backend.last_request().unwrap();
    assert_eq!(sent.voice_id, "en-US-JennyNeural");
    assert_eq!(sent.style, "cheerful");
    assert!(sent.markup.contains("pitch=\"+32%\""));
    assert!(sent.markup.contains("koh-nee-chee-wah"));
}

#[tokio::test]
async fn test_explicit_emotion_and_overrides() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend);

    let request = SynthesisRequest {
        pitch: Some(0.9),
        ..SynthesisRequest::new("Hello there").character("sakura").emotion("shy")
    };
    let out = service.synthesize_with_report(&request).await.unwrap();

    assert_eq!(out.emotion, EmotionCategory::Shy);
    assert_eq!(out.parameters.pitch, 0.9);
    assert!((out.parameters.speaking_rate - 0.8).abs() < 1e-5);
    assert!((out.parameters.energy - 0.88).abs() < 1e-5);
}

#[tokio::test]
async fn test_default_emotion_is_cheerful() {
    let service = offline_service();
    let plan = service.plan(&SynthesisRequest::new("plain words")).await.unwrap();
    assert_eq!(plan.emotion, EmotionCategory::Cheerful);
    assert!(plan.detection.is_none());
    assert_eq!(plan.character.id, "sakura");
}

#[tokio::test]
async fn test_voice_style_override_and_unknown_style() {
    let service = offline_service();
    let plan = service
        .plan(&SynthesisRequest::new("hi").character("miku").voice_style("cool"))
        .await
        .unwrap();
    assert_eq!(plan.settings.voice_style, VoiceStyle::Cool);
    assert_eq!(plan.settings.formant_shift, -0.05);

    let plan = service
        .plan(&SynthesisRequest::new("hi").character("miku").voice_style("sultry"))
        .await
        .unwrap();
    assert_eq!(plan.settings.voice_style, VoiceStyle::Energetic);
}

#[tokio::test]
async fn test_voice_style_reaches_the_effects_chain() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend.clone());
    let soft = SynthesisRequest::new("hello there")
        .emotion("neutral")
        .voice_style("soft");
    let cool = SynthesisRequest::new("hello there")
        .emotion("neutral")
        .voice_style("cool");

    let soft_plan = service.plan(&soft).await.unwrap();
    let cool_plan = service.plan(&cool).await.unwrap();
    assert_eq!(soft_plan.effects.breathiness, Some(0.4));
    assert_eq!(soft_plan.effects.pitch_variation, Some(0.1));
    assert_eq!(cool_plan.effects.breathiness, Some(0.1));
    assert_eq!(cool_plan.effects.pitch_variation, Some(0.05));
    // Character preset still owns the formant shift.
    assert_eq!(soft_plan.effects.formant_shift, Some(0.15));

    let soft_audio = service.synthesize(&soft).await.unwrap();
    let cool_audio = service.synthesize(&cool).await.unwrap();
    assert_ne!(soft_audio, cool_audio);
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_emotion_effects_win_over_style() {
    let service = offline_service();
    let plan = service
        .plan(&SynthesisRequest::new("um").emotion("shy").voice_style("cool"))
        .await
        .unwrap();
    assert_eq!(plan.effects.breathiness, Some(0.3));
    assert_eq!(plan.effects.pitch_variation, Some(0.05));
}

// ── Cache ───────────────────────────────────────────────────

#[tokio::test]
async fn test_cache_hit_is_byte_identical_and_backend_called_once() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend.clone());
    let request = SynthesisRequest::new("Ara ara~ you came back").character("rei");

    let first = service.synthesize_with_report(&request).await.unwrap();
    let second = service.synthesize_with_report(&request).await.unwrap();

    assert_eq!(first.audio, second.audio);
    assert_eq!(second.source, AudioSource::Cache);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_numeric_overrides_change_the_cache_key() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend.clone());
    let base = SynthesisRequest::new("Same text");

    service.synthesize(&base).await.unwrap();
    service
        .synthesize(&SynthesisRequest {
            speed: Some(1.1),
            ..base.clone()
        })
        .await
        .unwrap();
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_cache_disabled_always_calls_backend() {
    let backend = CountingBackend::new(MockMode::Tone);
    let mut config = TtsSystemConfig::default();
    config.cache.enabled = false;
    let service = SynthesisService::new(config).with_backend(backend.clone());

    let request = SynthesisRequest::new("again and again");
    service.synthesize(&request).await.unwrap();
    service.synthesize(&request).await.unwrap();
    assert_eq!(backend.call_count(), 2);
    assert_eq!(service.stats().await.cache_size, 0);
}

#[tokio::test]
async fn test_concurrent_identical_requests_share_one_backend_call() {
    let backend = CountingBackend::slow(Duration::from_millis(50));
    let service = service_with(backend.clone());
    let request = SynthesisRequest::new("Everyone asked at once!").character("miku");

    let outputs = join_all((0..4).map(|_| service.synthesize_with_report(&request))).await;
    let outputs: Vec<_> = outputs.into_iter().map(|o| o.unwrap()).collect();

    assert_eq!(backend.call_count(), 1);
    assert!(outputs.iter().all(|o| o.audio == outputs[0].audio));
    let rendered = outputs
        .iter()
        .filter(|o| o.source == AudioSource::Backend)
        .count();
    assert_eq!(rendered, 1);

    // Finished renders leave no slot behind; the next call is a plain cache hit.
    let again = service.synthesize_with_report(&request).await.unwrap();
    assert_eq!(again.source, AudioSource::Cache);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_concurrent_distinct_requests_are_not_merged() {
    let backend = CountingBackend::slow(Duration::from_millis(20));
    let service = service_with(backend.clone());
    let a = SynthesisRequest::new("first line");
    let b = SynthesisRequest::new("second line");

    let (ra, rb) = tokio::join!(service.synthesize(&a), service.synthesize(&b));
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(backend.call_count(), 2);
}

// ── Rejections ──────────────────────────────────────────────

#[tokio::test]
async fn test_empty_text_rejected_before_backend() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend.clone());

    let err = service.synthesize(&SynthesisRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, TtsError::EmptyText));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_output_format_rejected() {
    let service = offline_service();
    let request = SynthesisRequest {
        output_format: Some("mp3".into()),
        ..SynthesisRequest::new("hello")
    };
    let err = service.synthesize(&request).await.unwrap_err();
    assert!(matches!(err, TtsError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_non_positive_override_rejected() {
    let service = offline_service();
    let request = SynthesisRequest {
        speed: Some(0.0),
        ..SynthesisRequest::new("hello")
    };
    let err = service.synthesize(&request).await.unwrap_err();
    assert!(matches!(err, TtsError::InvalidParameter(_)));
}

// ── Degradation ─────────────────────────────────────────────

#[tokio::test]
async fn test_no_backend_yields_proportional_silence() {
    let service = offline_service();
    let out = service
        .synthesize_with_report(&SynthesisRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(out.source, AudioSource::Fallback);
    let decoded = decode_wav(&out.audio).unwrap();
    // 5 chars × 0.08 s at 22050 Hz
    assert_eq!(decoded.samples.len(), 8820);
    assert!(decoded.samples.iter().all(|s| *s == 0.0));
    assert_eq!(service.stats().await.cache_size, 0);
}

#[tokio::test]
async fn test_failing_backend_degrades_to_silence() {
    let backend = CountingBackend::new(MockMode::Fail);
    let service = service_with(backend.clone());
    let out = service
        .synthesize_with_report(&SynthesisRequest::new("Sugoi!"))
        .await
        .unwrap();
    assert_eq!(out.source, AudioSource::Fallback);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_unavailable_backend_is_not_called() {
    let backend = CountingBackend::new(MockMode::Unavailable);
    let service = service_with(backend.clone());
    for _ in 0..3 {
        let out = service
            .synthesize_with_report(&SynthesisRequest::new("anyone there?"))
            .await
            .unwrap();
        assert_eq!(out.source, AudioSource::Fallback);
    }
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_backend_rate_is_resampled_to_output_rate() {
    let backend = CountingBackend::with_rate(MockMode::Tone, 24000);
    let service = service_with(backend);
    let out = service
        .synthesize_with_report(&SynthesisRequest::new("Resample me").emotion("neutral"))
        .await
        .unwrap();
    assert_eq!(out.sample_rate, 22050);
    assert_eq!(decode_wav(&out.audio).unwrap().sample_rate, 22050);
}

#[tokio::test]
async fn test_pcm_output_is_headerless() {
    let service = offline_service();
    let out = service
        .synthesize(&SynthesisRequest::new("ab").format(OutputFormat::Pcm))
        .await
        .unwrap();
    // 2 chars × 0.08 s × 22050 Hz × 2 bytes
    assert_eq!(out.len(), 3528 * 2);
    assert_ne!(&out[0..4], b"RIFF");
}

// ── Characters and queries ──────────────────────────────────

#[tokio::test]
async fn test_registered_character_is_used_and_cache_cleared() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend.clone());
    let request = SynthesisRequest::new("New voice test").character("hana").emotion("neutral");

    service.synthesize(&request).await.unwrap();
    assert_eq!(service.stats().await.cache_size, 1);

    let profile = CharacterProfile {
        id: "hana".into(),
        base_pitch: 1.5,
        speaking_rate: 1.0,
        energy: 1.0,
        voice_style: VoiceStyle::Soft,
        accent: "none".into(),
        personality_traits: Default::default(),
        backend_voice: Some("en-US-AnaNeural".into()),
    };
    service.register_character("hana", profile).await.unwrap();
    assert_eq!(service.stats().await.cache_size, 0);

    let out = service.synthesize_with_report(&request).await.unwrap();
    assert_eq!(out.source, AudioSource::Backend);
    assert_eq!(out.parameters.pitch, 1.5);
    assert_eq!(backend.last_request().unwrap().voice_id, "en-US-AnaNeural");
}

#[tokio::test]
async fn test_register_from_document_rejects_missing_fields() {
    let service = offline_service();
    let err = service
        .register_character_value("hana", serde_json::json!({ "base_pitch": 1.1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::InvalidProfile(_)));
    assert_eq!(service.get_character("hana").await.id, "sakura");
}

#[tokio::test]
async fn test_every_builtin_character_is_positive() {
    let service = offline_service();
    for id in service.list_characters().await {
        let c = service.get_character(&id).await;
        assert!(c.base_pitch > 0.0 && c.speaking_rate > 0.0 && c.energy > 0.0, "{}", id);
    }
}

#[tokio::test]
async fn test_analyze_text_report() {
    let service = offline_service();
    let report = service.analyze_text("Ehehe~ that's funny!");
    assert_eq!(report.emotions.primary_emotion, EmotionCategory::Giggly);
    assert_eq!(report.recommended_character, "miku");
    assert!((report.estimated_duration - 20.0 * 0.08).abs() < 1e-5);
    assert!(report
        .pronunciation_guide
        .iter()
        .any(|(word, _)| word == "ehehe"));
}

#[tokio::test]
async fn test_queries_and_stats() {
    let backend = CountingBackend::new(MockMode::Tone);
    let service = service_with(backend);

    let voices = service.available_voices().await;
    assert_eq!(voices.characters, vec!["miku", "rei", "sakura", "yuki"]);
    assert_eq!(voices.voice_styles.len(), 4);
    assert_eq!(voices.emotions.len(), 9);
    assert_eq!(voices.backend_voices, vec!["mock-voice"]);

    let stats = service.stats().await;
    assert_eq!(stats.cache_capacity, 100);
    assert!(stats.cache_enabled);
    assert_eq!(stats.available_characters, 4);
    assert_eq!(stats.sample_rate, 22050);
    assert_eq!(stats.backend.as_deref(), Some("mock"));
    assert!(stats.backend_available);

    service.synthesize(&SynthesisRequest::new("fill")).await.unwrap();
    service.clear_cache().await;
    assert_eq!(service.stats().await.cache_size, 0);
}
