//! Integration tests for HTTP handlers
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use application::{
    ComposerConfig, GeneratedText, GenerationRequest, ManualClock, PipelineConfig, ProviderError,
    QuotaTracker, RetryPolicy, SpeechSynthesisPort, SpeechSynthesizer, StoryComposer,
    StoryGenerationPort, StoryPipeline, SynthesisVoice, SynthesizedAudio, SynthesizerConfig,
};
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use domain::{AudioFormat, LanguageCode, VoiceCatalog};
use infrastructure::InMemoryQuotaStore;
use presentation_http::{
    IdentityResolver, SessionSigner, routes::create_router, state::AppState,
};
use serde_json::{Value, json};

const STORY: &str = "Once upon a time, Emma found a map under her pillow. \
    She followed it across the garden to an old oak tree. \
    Inside the hollow she found a tiny golden key. \
    The key opened a box full of seashells that sang softly. \
    Emma smiled, yawned, and drifted off to sleep.";

/// Story generator with a fixed answer
struct FakeGenerator {
    outcome: Result<String, ProviderError>,
    healthy: bool,
    calls: AtomicUsize,
}

impl FakeGenerator {
    fn story() -> Self {
        Self {
            outcome: Ok(STORY.to_string()),
            healthy: true,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(err: ProviderError) -> Self {
        Self {
            outcome: Err(err),
            healthy: true,
            calls: AtomicUsize::new(0),
        }
    }

    fn down() -> Self {
        Self {
            healthy: false,
            ..Self::story()
        }
    }
}

#[async_trait]
impl StoryGenerationPort for FakeGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<GeneratedText, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map(|text| GeneratedText {
            text,
            model: "fake-storyteller".to_string(),
            tokens_used: Some(120),
            latency_ms: 5,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.healthy
    }

    fn model_name(&self) -> String {
        "fake-storyteller".to_string()
    }
}

/// Narrator returning a short mp3 frame per chunk
struct FakeNarrator {
    available: bool,
}

#[async_trait]
impl SpeechSynthesisPort for FakeNarrator {
    async fn synthesize(
        &self,
        _text: String,
        _voice: SynthesisVoice,
    ) -> Result<SynthesizedAudio, ProviderError> {
        Ok(SynthesizedAudio {
            audio: b"\xFF\xFBok".to_vec(),
            format: AudioFormat::Mp3,
            duration: Some(Duration::from_secs(60)),
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn max_input_chars(&self) -> usize {
        4096
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }
}

struct Harness {
    server: TestServer,
    generator: Arc<FakeGenerator>,
    clock: ManualClock,
    _scratch: tempfile::TempDir,
}

fn harness_with(generator: FakeGenerator, narrator: FakeNarrator) -> Harness {
    let scratch = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap());
    let quota = Arc::new(QuotaTracker::new(
        Arc::new(InMemoryQuotaStore::new()),
        Arc::new(clock.clone()),
    ));

    let generator = Arc::new(generator);
    let narrator = Arc::new(narrator);

    let composer = StoryComposer::with_config(
        generator.clone(),
        ComposerConfig {
            retry: RetryPolicy::none(),
            ..ComposerConfig::default()
        },
    );
    let synthesizer = SpeechSynthesizer::with_config(
        narrator.clone(),
        SynthesizerConfig {
            retry: RetryPolicy::none(),
            ..SynthesizerConfig::default()
        },
    );
    let pipeline = StoryPipeline::new(
        quota,
        Arc::new(composer),
        Arc::new(synthesizer),
        Arc::new(VoiceCatalog::default()),
        PipelineConfig {
            daily_limit: 10,
            scratch_dir: Some(scratch.path().to_path_buf()),
        },
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        story_generator: generator.clone(),
        narrator,
        identity: Arc::new(IdentityResolver::new(
            SessionSigner::new("integration-secret").unwrap(),
            true,
        )),
    };

    Harness {
        server: TestServer::new(create_router(state)).expect("Failed to create test server"),
        generator,
        clock,
        _scratch: scratch,
    }
}

fn harness() -> Harness {
    harness_with(FakeGenerator::story(), FakeNarrator { available: true })
}

/// Address the fronting proxy reports for a client
fn client(addr: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_str(addr).unwrap(),
    )
}

fn session(id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-session-id"),
        HeaderValue::from_str(id).unwrap(),
    )
}

fn story_form() -> Value {
    json!({
        "child_name": "emma",
        "age_group": "young",
        "theme": "Pirates & Treasure",
        "voice": "warm_female"
    })
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let h = harness();
    let response = h.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn ready_endpoint_reports_both_providers() {
    let h = harness();
    let response = h.server.get("/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ready"], true);
    assert_eq!(body["story_generation"]["healthy"], true);
    assert_eq!(body["story_generation"]["model"], "fake-storyteller");
    assert_eq!(body["narration"]["healthy"], true);
}

#[tokio::test]
async fn ready_endpoint_unavailable_when_generator_down() {
    let h = harness_with(FakeGenerator::down(), FakeNarrator { available: true });
    let response = h.server.get("/ready").await;

    response.assert_status_service_unavailable();
    let body: Value = response.json();
    assert_eq!(body["ready"], false);
    assert_eq!(body["story_generation"]["healthy"], false);
}

#[tokio::test]
async fn ready_endpoint_unavailable_when_narrator_down() {
    let h = harness_with(FakeGenerator::story(), FakeNarrator { available: false });
    let response = h.server.get("/ready").await;

    response.assert_status_service_unavailable();
    let body: Value = response.json();
    assert_eq!(body["narration"]["healthy"], false);
}

// ============================================================================
// Catalog and quota
// ============================================================================

#[tokio::test]
async fn catalog_lists_form_options() {
    let h = harness();
    let response = h.server.get("/v1/catalog").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["age_groups"].as_array().unwrap().len(), 4);
    assert_eq!(body["age_groups"][1]["id"], "young");
    assert!(
        body["themes"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t == "Pirates & Treasure")
    );
    assert_eq!(body["custom_theme"], "Custom");
    assert!(
        body["voices"]
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v["id"] == "warm_female")
    );
    assert!(
        body["languages"]
            .as_array()
            .unwrap()
            .iter()
            .any(|l| l["code"] == LanguageCode::english().as_str())
    );
    assert_eq!(body["daily_limit"], 10);
}

#[tokio::test]
async fn quota_for_new_client_is_full() {
    let h = harness();
    let (name, value) = client("203.0.113.1");
    let response = h.server.get("/v1/quota").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["used"], 0);
    assert_eq!(body["remaining"], 10);
    assert_eq!(body["daily_limit"], 10);
    assert_eq!(body["resets_at"], "2025-03-15T00:00:00Z");
}

// ============================================================================
// Story creation
// ============================================================================

#[tokio::test]
async fn create_story_returns_audio_with_headers() {
    let h = harness();
    let (name, value) = client("203.0.113.2");
    let response = h
        .server
        .post("/v1/stories")
        .add_header(name, value)
        .json(&story_form())
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "audio/mpeg");
    let disposition = response.header("content-disposition");
    assert!(
        disposition
            .to_str()
            .unwrap()
            .contains("emma-pirates-treasure.mp3")
    );
    assert_eq!(response.header("x-quota-remaining"), "9");
    assert!(response.maybe_header("x-story-duration-seconds").is_some());
    assert!(response.as_bytes().starts_with(b"\xFF\xFB"));
}

#[tokio::test]
async fn story_consumes_quota() {
    let h = harness();
    let (name, value) = client("203.0.113.3");
    h.server
        .post("/v1/stories")
        .add_header(name.clone(), value.clone())
        .json(&story_form())
        .await
        .assert_status_ok();

    let body: Value = h.server.get("/v1/quota").add_header(name, value).await.json();
    assert_eq!(body["used"], 1);
    assert_eq!(body["remaining"], 9);
}

#[tokio::test]
async fn eleventh_story_is_rejected_until_midnight() {
    let h = harness();
    let (name, value) = client("203.0.113.4");

    for _ in 0..10 {
        h.server
            .post("/v1/stories")
            .add_header(name.clone(), value.clone())
            .json(&story_form())
            .await
            .assert_status_ok();
    }

    let response = h
        .server
        .post("/v1/stories")
        .add_header(name.clone(), value.clone())
        .json(&story_form())
        .await;

    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
    let retry_after: i64 = response
        .header("retry-after")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    let body: Value = response.json();
    assert_eq!(body["code"], "quota_exceeded");
    assert_eq!(body["resets_at"], "2025-03-15T00:00:00Z");
    assert!(body["error"].as_str().unwrap().contains("10 stories today"));
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 10);

    h.clock.set(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 1).unwrap());
    h.server
        .post("/v1/stories")
        .add_header(name, value)
        .json(&story_form())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn clients_have_separate_quotas() {
    let h = harness();
    let (name, first) = client("203.0.113.5");
    for _ in 0..10 {
        h.server
            .post("/v1/stories")
            .add_header(name.clone(), first.clone())
            .json(&story_form())
            .await
            .assert_status_ok();
    }

    let (name, second) = client("203.0.113.6");
    let response = h
        .server
        .post("/v1/stories")
        .add_header(name, second)
        .json(&story_form())
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-quota-remaining"), "9");
}

#[tokio::test]
async fn quota_response_issues_session_id() {
    let h = harness();
    let (name, value) = client("198.51.100.10");
    let response = h.server.get("/v1/quota").add_header(name, value).await;

    response.assert_status_ok();
    let issued = response.header("x-session-id");
    assert!(!issued.to_str().unwrap().is_empty());
}

#[tokio::test]
async fn made_up_session_ids_share_the_address_quota() {
    let h = harness();
    let (addr_name, addr) = client("198.51.100.20");

    let mut admitted = 0;
    for i in 0..25 {
        let (name, value) = session(&format!("rotated-{i}"));
        let response = h
            .server
            .post("/v1/stories")
            .add_header(addr_name.clone(), addr.clone())
            .add_header(name, value)
            .json(&story_form())
            .await;
        if response.status_code().is_success() {
            admitted += 1;
        } else {
            response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(admitted, 10);
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn issued_session_follows_client_to_new_address() {
    let h = harness();
    let (name, home) = client("198.51.100.30");
    let response = h
        .server
        .post("/v1/stories")
        .add_header(name, home)
        .json(&story_form())
        .await;
    response.assert_status_ok();
    let issued = response.header("x-session-id");

    let (name, away) = client("192.0.2.99");
    let body: Value = h
        .server
        .get("/v1/quota")
        .add_header(name.clone(), away.clone())
        .add_header(HeaderName::from_static("x-session-id"), issued)
        .await
        .json();
    assert_eq!(body["used"], 1);

    // Without the session id the new address is a separate caller.
    let body: Value = h.server.get("/v1/quota").add_header(name, away).await.json();
    assert_eq!(body["used"], 0);
}

#[tokio::test]
async fn missing_field_is_bad_request() {
    let h = harness();
    let response = h
        .server
        .post("/v1/stories")
        .json(&json!({ "child_name": "emma", "age_group": "young" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["field"], "body");
}

#[tokio::test]
async fn blank_name_names_the_field() {
    let h = harness();
    let mut form = story_form();
    form["child_name"] = json!("");
    let response = h.server.post("/v1/stories").json(&form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["field"], "child_name");
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_voice_is_bad_request_without_quota_use() {
    let h = harness();
    let (name, value) = client("203.0.113.7");
    let mut form = story_form();
    form["voice"] = json!("robot");
    let response = h
        .server
        .post("/v1/stories")
        .add_header(name.clone(), value.clone())
        .json(&form)
        .await;

    response.assert_status_bad_request();
    let body: Value = h.server.get("/v1/quota").add_header(name, value).await.json();
    assert_eq!(body["used"], 0);
}

#[tokio::test]
async fn custom_theme_without_description_is_rejected() {
    let h = harness();
    let mut form = story_form();
    form["theme"] = json!("Custom");
    let response = h.server.post("/v1/stories").json(&form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn custom_theme_with_description_succeeds() {
    let h = harness();
    let mut form = story_form();
    form["theme"] = json!("Custom");
    form["custom_theme"] = json!("Trains that fly");
    let response = h.server.post("/v1/stories").json(&form).await;

    response.assert_status_ok();
    assert!(
        response
            .header("content-disposition")
            .to_str()
            .unwrap()
            .contains("emma-trains-that-fly.mp3")
    );
}

#[tokio::test]
async fn content_filter_maps_to_unprocessable() {
    let h = harness_with(
        FakeGenerator::failing(ProviderError::ContentFiltered("unsafe theme".to_string())),
        FakeNarrator { available: true },
    );
    let (name, value) = client("203.0.113.8");
    let response = h
        .server
        .post("/v1/stories")
        .add_header(name.clone(), value.clone())
        .json(&story_form())
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "content_policy");

    // Reserved slots are not refunded.
    let body: Value = h.server.get("/v1/quota").add_header(name, value).await.json();
    assert_eq!(body["used"], 1);
}

#[tokio::test]
async fn provider_outage_maps_to_service_unavailable() {
    let h = harness_with(
        FakeGenerator::failing(ProviderError::Unavailable("connection refused".to_string())),
        FakeNarrator { available: true },
    );
    let response = h.server.post("/v1/stories").json(&story_form()).await;

    response.assert_status_service_unavailable();
    let body: Value = response.json();
    assert_eq!(body["code"], "story_unavailable");
}

#[tokio::test]
async fn provider_timeout_maps_to_gateway_timeout() {
    let h = harness_with(
        FakeGenerator::failing(ProviderError::Timeout(60_000)),
        FakeNarrator { available: true },
    );
    let response = h.server.post("/v1/stories").json(&story_form()).await;

    response.assert_status(axum::http::StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json();
    assert_eq!(body["code"], "story_timeout");
}
