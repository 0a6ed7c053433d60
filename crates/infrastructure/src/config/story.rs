//! Story composition and synthesis tuning.

use std::path::PathBuf;
use std::time::Duration;

use application::{ComposerConfig, RetryPolicy, SynthesizerConfig};
use serde::{Deserialize, Serialize};

/// Limits and retry settings for one story run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Generated text shorter than this is rejected
    #[serde(default = "default_min_story_chars")]
    pub min_story_chars: usize,

    /// Generated text beyond this is cut at a sentence boundary
    #[serde(default = "default_max_story_chars")]
    pub max_story_chars: usize,

    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    #[serde(default = "default_chunk_timeout")]
    pub chunk_timeout_secs: u64,

    /// Preferred chunk size; the speech provider's own maximum still applies
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    #[serde(default = "default_parallel_chunks")]
    pub max_parallel_chunks: usize,

    #[serde(default = "RetryPolicy::generation")]
    pub generation_retry: RetryPolicy,

    #[serde(default = "RetryPolicy::synthesis")]
    pub synthesis_retry: RetryPolicy,

    /// Parent directory for per-request scratch space (system temp if unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

const fn default_min_story_chars() -> usize {
    200
}

const fn default_max_story_chars() -> usize {
    16_000
}

const fn default_generation_timeout() -> u64 {
    60
}

const fn default_chunk_timeout() -> u64 {
    45
}

const fn default_max_chunk_chars() -> usize {
    2000
}

const fn default_parallel_chunks() -> usize {
    3
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            min_story_chars: default_min_story_chars(),
            max_story_chars: default_max_story_chars(),
            generation_timeout_secs: default_generation_timeout(),
            chunk_timeout_secs: default_chunk_timeout(),
            max_chunk_chars: default_max_chunk_chars(),
            max_parallel_chunks: default_parallel_chunks(),
            generation_retry: RetryPolicy::generation(),
            synthesis_retry: RetryPolicy::synthesis(),
            scratch_dir: None,
        }
    }
}

impl StoryConfig {
    /// Composer settings; sampling parameters come from the inference section
    #[must_use]
    pub fn composer_config(&self, inference: &ai_core::InferenceConfig) -> ComposerConfig {
        ComposerConfig {
            generation_timeout: Duration::from_secs(self.generation_timeout_secs),
            min_story_chars: self.min_story_chars,
            max_story_chars: self.max_story_chars,
            max_tokens: Some(inference.max_tokens),
            temperature: Some(inference.temperature),
            top_p: Some(inference.top_p),
            retry: self.generation_retry.clone(),
        }
    }

    #[must_use]
    pub fn synthesizer_config(&self) -> SynthesizerConfig {
        SynthesizerConfig {
            max_parallel_chunks: self.max_parallel_chunks.max(1),
            max_chunk_chars: self.max_chunk_chars,
            chunk_timeout: Duration::from_secs(self.chunk_timeout_secs),
            retry: self.synthesis_retry.clone(),
        }
    }
}
