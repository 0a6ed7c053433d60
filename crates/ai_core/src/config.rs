//! Configuration for the story generation engine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Configuration for an OpenAI-compatible chat-completions provider
#[derive(Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// API base URL, without the trailing `/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model to use
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-p (nucleus) sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

const fn default_timeout_ms() -> u64 {
    60000 // 60 seconds
}

const fn default_max_tokens() -> u32 {
    4000
}

const fn default_temperature() -> f32 {
    0.8
}

const fn default_top_p() -> f32 {
    0.9
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .finish()
    }
}

impl InferenceConfig {
    /// Config pointing at `base_url` with the given key
    pub fn with_endpoint(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Check that the engine can be built from this config
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(InferenceError::Configuration(
                "inference.api_key is required".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(InferenceError::Configuration(format!(
                "inference.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(InferenceError::Configuration(
                "inference.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(InferenceError::Configuration(
                "inference.top_p must be in (0.0, 1.0]".to_string(),
            ));
        }
        if self.max_tokens == 0 || self.timeout_ms == 0 {
            return Err(InferenceError::Configuration(
                "inference.max_tokens and inference.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
