//! Story generation adapter - Implements StoryGenerationPort using ai_core

use std::time::Instant;

use ai_core::{InferenceConfig, InferenceEngine, InferenceError, InferenceRequest, OpenAiCompatibleEngine};
use application::{
    error::{ApplicationError, ProviderError},
    ports::{GeneratedText, GenerationRequest, StoryGenerationPort},
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Adapter for OpenAI-compatible story generation
#[derive(Debug)]
pub struct StoryGenerationAdapter<E = OpenAiCompatibleEngine> {
    engine: E,
}

impl StoryGenerationAdapter {
    /// Create a new adapter with the given configuration
    pub fn new(config: InferenceConfig) -> Result<Self, ApplicationError> {
        let engine = OpenAiCompatibleEngine::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self { engine })
    }
}

impl<E: InferenceEngine> StoryGenerationAdapter<E> {
    /// Wrap an existing engine
    pub const fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// Convert ai_core error to provider error
    fn map_error(e: InferenceError) -> ProviderError {
        match e {
            InferenceError::Timeout(ms) => ProviderError::Timeout(ms),
            InferenceError::RateLimited => {
                ProviderError::Unavailable("generation rate limit reached".to_string())
            },
            InferenceError::ConnectionFailed(msg) => {
                ProviderError::Unavailable(format!("connection failed: {msg}"))
            },
            InferenceError::ServerError(msg) => ProviderError::Unavailable(msg),
            InferenceError::ContentFiltered(msg) => ProviderError::ContentFiltered(msg),
            InferenceError::InvalidResponse(msg) => ProviderError::InvalidResponse(msg),
            other @ (InferenceError::Rejected { .. }
            | InferenceError::RequestFailed(_)
            | InferenceError::ModelNotAvailable(_)
            | InferenceError::Configuration(_)) => ProviderError::Rejected(other.to_string()),
        }
    }
}

#[async_trait]
impl<E: InferenceEngine> StoryGenerationPort for StoryGenerationAdapter<E> {
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len()))]
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, ProviderError> {
        let start = Instant::now();

        let mut inference = InferenceRequest::with_system(request.system_prompt, request.prompt);
        inference.max_tokens = request.max_tokens;
        inference.temperature = request.temperature;
        inference.top_p = request.top_p;

        let response = self
            .engine
            .generate(inference)
            .await
            .map_err(Self::map_error)?;

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        debug!(
            model = %response.model,
            tokens = ?response.usage.as_ref().map(|u| u.total_tokens),
            latency_ms,
            "Story generation completed"
        );

        Ok(GeneratedText {
            text: response.content,
            model: response.model,
            tokens_used: response.usage.map(|u| u.total_tokens),
            latency_ms,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.engine.health_check().await.unwrap_or(false)
    }

    fn model_name(&self) -> String {
        self.engine.default_model().to_string()
    }
}
