//! Story generation port - Interface to the text-generation provider

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ProviderError;

/// One generation call: system prompt, user prompt and sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// Text returned by the provider
#[derive(Debug, Clone)]
pub struct GeneratedText {
    pub text: String,
    /// Model that produced the text
    pub model: String,
    /// Total tokens billed, if reported
    pub tokens_used: Option<u32>,
    /// Provider latency in milliseconds
    pub latency_ms: u64,
}

/// Port for story text generation
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoryGenerationPort: Send + Sync {
    /// Generate text for the request
    ///
    /// Implementations classify failures into [`ProviderError`] variants; the
    /// caller applies timeouts and retries.
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, ProviderError>;

    /// Check if the provider is reachable
    async fn is_healthy(&self) -> bool;

    /// Name of the configured model
    fn model_name(&self) -> String;
}
