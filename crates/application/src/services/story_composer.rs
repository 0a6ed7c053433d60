//! Story composer - Turns a story request into narrative text
//!
//! Builds the prompt, calls the generation provider under a timeout, retries
//! transient failures once and validates the returned text.

use std::{fmt, sync::Arc, time::Duration};

use domain::{StoryRequest, StoryText};
use tracing::{info, instrument, warn};

use crate::{
    error::{ApplicationError, ProviderError},
    ports::{GenerationRequest, StoryGenerationPort},
    retry::RetryPolicy,
    services::story_prompt::StoryPrompt,
};

/// Configuration for story composition
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Upper bound for a single generation call
    pub generation_timeout: Duration,
    /// Shorter stories are rejected as an invalid response
    pub min_story_chars: usize,
    /// Longer stories are cut at a sentence boundary
    pub max_story_chars: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub retry: RetryPolicy,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(60),
            min_story_chars: 200,
            max_story_chars: 16_000,
            max_tokens: Some(4000),
            temperature: Some(0.8),
            top_p: Some(0.9),
            retry: RetryPolicy::generation(),
        }
    }
}

/// Service that writes the story text
pub struct StoryComposer {
    generator: Arc<dyn StoryGenerationPort>,
    config: ComposerConfig,
}

impl fmt::Debug for StoryComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryComposer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StoryComposer {
    /// Create a composer with default configuration
    pub fn new(generator: Arc<dyn StoryGenerationPort>) -> Self {
        Self::with_config(generator, ComposerConfig::default())
    }

    pub fn with_config(generator: Arc<dyn StoryGenerationPort>, config: ComposerConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Generate the story text for `request`
    ///
    /// Fails with [`ApplicationError::Provider`] when the provider stays
    /// unavailable or times out after the retry, and with
    /// [`ApplicationError::ContentPolicy`] when the content is refused.
    #[instrument(skip(self, request), fields(
        age_group = %request.age_group(),
        language = %request.language(),
        theme = %request.theme()
    ))]
    pub async fn compose(&self, request: &StoryRequest) -> Result<StoryText, ApplicationError> {
        let prompt = StoryPrompt::for_request(request);
        let generation = GenerationRequest {
            system_prompt: prompt.system,
            prompt: prompt.user,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };
        let timeout = self.config.generation_timeout;

        let outcome = self
            .config
            .retry
            .run(|| {
                let generator = Arc::clone(&self.generator);
                let generation = generation.clone();
                async move { generate_within(generator.as_ref(), generation, timeout).await }
            })
            .await;
        let attempts = outcome.attempts;

        let generated = outcome.into_result().map_err(|err| match err {
            ProviderError::ContentFiltered(reason) => ApplicationError::ContentPolicy(reason),
            other => ApplicationError::Provider(other),
        })?;

        let story = StoryText::new(&generated.text);
        if story.is_empty() {
            warn!(attempts, "Generator returned an empty story");
            return Err(ProviderError::InvalidResponse("generated story is empty".to_string()).into());
        }

        if story.char_count() < self.config.min_story_chars {
            warn!(
                attempts,
                chars = story.char_count(),
                min_chars = self.config.min_story_chars,
                "Generator returned a story that is too short"
            );
            return Err(ProviderError::InvalidResponse(format!(
                "generated story is too short ({} characters)",
                story.char_count()
            ))
            .into());
        }

        let (story, truncated) = story.truncate_at_sentence(self.config.max_story_chars);
        if truncated {
            warn!(
                max_chars = self.config.max_story_chars,
                kept_chars = story.char_count(),
                "Story exceeded ceiling, truncated at sentence boundary"
            );
        }

        if !story.mentions(request.child_name().as_str()) {
            warn!("Generated story does not mention the child's name");
        }

        info!(
            attempts,
            words = story.word_count(),
            chars = story.char_count(),
            model = %generated.model,
            latency_ms = generated.latency_ms,
            "Story composed"
        );

        Ok(story)
    }
}

#[allow(clippy::cast_possible_truncation)]
async fn generate_within(
    generator: &dyn StoryGenerationPort,
    request: GenerationRequest,
    timeout: Duration,
) -> Result<crate::ports::GeneratedText, ProviderError> {
    tokio::time::timeout(timeout, generator.generate(request))
        .await
        .unwrap_or_else(|_| Err(ProviderError::Timeout(timeout.as_millis() as u64)))
}
