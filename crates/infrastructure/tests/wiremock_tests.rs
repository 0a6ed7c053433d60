//! Provider adapters and the full story pipeline against mocked HTTP APIs

use std::sync::Arc;
use std::time::Duration;

use ai_core::InferenceConfig;
use ai_speech::SpeechConfig;
use application::{
    ApplicationError, ComposerConfig, GenerationRequest, ManualClock, PipelineConfig,
    ProviderError, QuotaTracker, RetryPolicy, SpeechSynthesisPort, SpeechSynthesizer,
    StoryComposer, StoryGenerationPort, StoryPipeline, SynthesisVoice, SynthesizerConfig,
};
use chrono::{TimeZone, Utc};
use domain::{AudioFormat, FailureKind, Identity, LanguageCode, StoryRequest, VoiceCatalog};
use infrastructure::{InMemoryQuotaStore, SpeechSynthesisAdapter, StoryGenerationAdapter};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

const SENTENCE: &str = "Emma sailed past the singing whales toward the island of gold. ";

fn inference_config(server: &MockServer) -> InferenceConfig {
    InferenceConfig {
        base_url: server.uri(),
        api_key: Some("gen-key".to_string()),
        default_model: "story-model".to_string(),
        timeout_ms: 2_000,
        ..InferenceConfig::default()
    }
}

fn speech_config(server: &MockServer) -> SpeechConfig {
    SpeechConfig {
        base_url: server.uri(),
        api_key: Some("tts-key".to_string()),
        timeout_ms: 2_000,
        ..SpeechConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "story-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 100, "completion_tokens": 800, "total_tokens": 900 }
    })
}

fn generation_request() -> GenerationRequest {
    GenerationRequest {
        system_prompt: "You are a storyteller".to_string(),
        prompt: "Tell Emma a pirate story".to_string(),
        max_tokens: Some(1200),
        temperature: Some(0.8),
        top_p: Some(0.9),
    }
}

mod generation_adapter {
    use super::*;

    #[tokio::test]
    async fn forwards_sampling_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gen-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "story-model",
                "max_tokens": 1200,
                "messages": [
                    { "role": "system", "content": "You are a storyteller" },
                    { "role": "user", "content": "Tell Emma a pirate story" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Once upon a time.")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = StoryGenerationAdapter::new(inference_config(&server)).unwrap();
        let generated = adapter.generate(generation_request()).await.unwrap();

        assert_eq!(generated.text, "Once upon a time.");
        assert_eq!(generated.model, "story-model");
        assert_eq!(generated.tokens_used, Some(900));
        assert_eq!(adapter.model_name(), "story-model");
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let adapter = StoryGenerationAdapter::new(inference_config(&server)).unwrap();
        let err = adapter.generate(generation_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unauthorized_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "invalid api key", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let adapter = StoryGenerationAdapter::new(inference_config(&server)).unwrap();
        let err = adapter.generate(generation_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = InferenceConfig {
            timeout_ms: 100,
            ..inference_config(&server)
        };
        let adapter = StoryGenerationAdapter::new(config).unwrap();
        let err = adapter.generate(generation_request()).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(100));
    }

    #[tokio::test]
    async fn health_follows_models_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{ "id": "story-model", "object": "model" }]
            })))
            .mount(&server)
            .await;

        let adapter = StoryGenerationAdapter::new(inference_config(&server)).unwrap();
        assert!(adapter.is_healthy().await);
    }
}

mod speech_adapter {
    use super::*;

    fn voice() -> SynthesisVoice {
        SynthesisVoice {
            provider_voice: "fable".to_string(),
            speed: 0.85,
            language: LanguageCode::english(),
        }
    }

    #[tokio::test]
    async fn returns_audio_in_configured_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(header("authorization", "Bearer tts-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "tts-1",
                "input": "Once upon a time.",
                "voice": "fable",
                "response_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = SpeechSynthesisAdapter::new(speech_config(&server)).unwrap();
        let audio = adapter
            .synthesize("Once upon a time.".to_string(), voice())
            .await
            .unwrap();

        assert_eq!(audio.audio, vec![0xFF, 0xFB, 0x90, 0x00]);
        assert_eq!(audio.format, AudioFormat::Mp3);
        assert_eq!(adapter.output_format(), AudioFormat::Mp3);
        assert_eq!(adapter.max_input_chars(), 4096);
    }

    #[tokio::test]
    async fn rate_limit_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "slow down", "code": "rate_limit_exceeded" }
            })))
            .mount(&server)
            .await;

        let adapter = SpeechSynthesisAdapter::new(speech_config(&server)).unwrap();
        let err = adapter
            .synthesize("Hello.".to_string(), voice())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn empty_body_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::<u8>::new()))
            .mount(&server)
            .await;

        let adapter = SpeechSynthesisAdapter::new(speech_config(&server)).unwrap();
        let err = adapter
            .synthesize("Hello.".to_string(), voice())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}

mod pipeline {
    use super::*;

    struct Harness {
        pipeline: StoryPipeline,
        _scratch: tempfile::TempDir,
    }

    fn harness(generation: &MockServer, speech: &MockServer) -> Harness {
        let scratch = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
        let quota = QuotaTracker::new(Arc::new(InMemoryQuotaStore::new()), Arc::new(clock));

        let generator = StoryGenerationAdapter::new(inference_config(generation)).unwrap();
        let composer = StoryComposer::with_config(
            Arc::new(generator),
            ComposerConfig {
                retry: RetryPolicy::none(),
                ..ComposerConfig::default()
            },
        );

        let narrator = SpeechSynthesisAdapter::new(speech_config(speech)).unwrap();
        let synthesizer = SpeechSynthesizer::with_config(
            Arc::new(narrator),
            SynthesizerConfig {
                max_chunk_chars: 1000,
                retry: RetryPolicy::none(),
                ..SynthesizerConfig::default()
            },
        );

        let pipeline = StoryPipeline::new(
            Arc::new(quota),
            Arc::new(composer),
            Arc::new(synthesizer),
            Arc::new(VoiceCatalog::default()),
            PipelineConfig {
                scratch_dir: Some(scratch.path().to_path_buf()),
                ..PipelineConfig::default()
            },
        );

        Harness {
            pipeline,
            _scratch: scratch,
        }
    }

    fn request() -> StoryRequest {
        StoryRequest::parse("Emma", "young", "Pirates & Treasure", "storyteller", "en").unwrap()
    }

    #[tokio::test]
    async fn story_flows_through_both_providers() {
        let generation = MockServer::start().await;
        let speech = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&SENTENCE.repeat(40))))
            .expect(1)
            .mount(&generation)
            .await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]))
            .mount(&speech)
            .await;

        let h = harness(&generation, &speech);
        let identity = Identity::new("203.0.113.7").unwrap();
        let story = h.pipeline.generate(&request(), &identity).await.unwrap();

        let chunks = story.artifact.chunk_count;
        assert!(chunks >= 3, "expected several chunks, got {chunks}");
        assert_eq!(story.artifact.audio.len(), 4 * chunks);
        assert_eq!(story.artifact.format, AudioFormat::Mp3);
        assert_eq!(story.artifact.file_name, "emma-pirates-treasure.mp3");
        assert_eq!(story.remaining_today, 9);

        let requests = speech.received_requests().await.unwrap();
        assert_eq!(requests.len(), chunks);
    }

    #[tokio::test]
    async fn speech_outage_fails_and_keeps_slot() {
        let generation = MockServer::start().await;
        let speech = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&SENTENCE.repeat(5))))
            .mount(&generation)
            .await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&speech)
            .await;

        let h = harness(&generation, &speech);
        let identity = Identity::new("203.0.113.7").unwrap();
        let err = h.pipeline.generate(&request(), &identity).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Synthesis);
        assert!(matches!(err, ApplicationError::Synthesis { .. }));

        let status = h.pipeline.quota_status(&identity).await.unwrap();
        assert_eq!(status.used, 1);
    }
}
