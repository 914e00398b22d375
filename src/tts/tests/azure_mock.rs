use super::helpers::sine;
use crate::audio::{decode_wav, wav::encode_wav};
use crate::tts::azure::AzureBackend;
use crate::tts::config::BackendConfig;
use crate::tts::{AudioSource, SynthesisRequest, SynthesisService, TtsSystemConfig};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SYNTH_PATH: &str = "/cognitiveservices/v1";

fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        api_key: Some("test-key".into()),
        endpoint: Some(format!("{}{}", server.uri(), SYNTH_PATH)),
        ..Default::default()
    }
}

fn service_for(server: &MockServer) -> SynthesisService {
    let backend = AzureBackend::from_config(&backend_config(server)).unwrap();
    SynthesisService::new(TtsSystemConfig::default()).with_backend(Arc::new(backend))
}

#[tokio::test]
async fn test_azure_posts_ssml_and_decodes_riff() {
    let server = MockServer::start().await;
    let riff = encode_wav(&sine(330.0, 24000, 0.3, 0.5)).unwrap();

    Mock::given(method("POST"))
        .and(path(SYNTH_PATH))
        .and(header("Ocp-Apim-Subscription-Key", "test-key"))
        .and(header("Content-Type", "application/ssml+xml"))
        .and(header("X-Microsoft-OutputFormat", "riff-24khz-16bit-mono-pcm"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(riff))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let out = service
        .synthesize_with_report(&SynthesisRequest::new("Kawaii! Yatta~").character("miku"))
        .await
        .unwrap();

    assert_eq!(out.source, AudioSource::Backend);
    let decoded = decode_wav(&out.audio).unwrap();
    assert_eq!(decoded.sample_rate, 22050);
    assert!(!decoded.samples.is_empty());

    let received = server.received_requests().await.unwrap();
    let body = String::from_utf8(received[0].body.clone()).unwrap();
    assert!(body.starts_with("<speak"));
    assert!(body.contains("<voice name=\"en-US-MichelleNeural\">"));
    assert!(body.contains("<emphasis level=\"strong\">kah-wah-ee</emphasis>"));
    assert!(body.contains("yah-ttah~<break time=\"250ms\"/>"));
}

#[tokio::test]
async fn test_azure_error_status_falls_back_to_silence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTH_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid subscription key"))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let out = service
        .synthesize_with_report(&SynthesisRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(out.source, AudioSource::Fallback);
    let decoded = decode_wav(&out.audio).unwrap();
    assert!(decoded.samples.iter().all(|s| *s == 0.0));
}

#[tokio::test]
async fn test_azure_garbage_body_falls_back_to_silence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a wav".to_vec()))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let out = service
        .synthesize_with_report(&SynthesisRequest::new("hello"))
        .await
        .unwrap();
    assert_eq!(out.source, AudioSource::Fallback);
}
