//! Configuration for speech synthesis

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::AudioFormat;

/// Longest input the OpenAI speech endpoint accepts
pub const OPENAI_MAX_INPUT_CHARS: usize = 4096;

/// Configuration for the speech provider
#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// API key sent as bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for compatible endpoints)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Text-to-speech model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Default voice for TTS
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Output audio format
    #[serde(default)]
    pub output_format: AudioFormat,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Default speaking speed (0.25 to 4.0)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Longest text sent in one call
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "nova".to_string()
}

const fn default_timeout_ms() -> u64 {
    45000 // 45 seconds
}

const fn default_speed() -> f32 {
    1.0
}

const fn default_max_input_chars() -> usize {
    OPENAI_MAX_INPUT_CHARS
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            tts_model: default_tts_model(),
            default_voice: default_voice(),
            output_format: AudioFormat::default(),
            timeout_ms: default_timeout_ms(),
            speed: default_speed(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("tts_model", &self.tts_model)
            .field("default_voice", &self.default_voice)
            .field("output_format", &self.output_format)
            .field("timeout_ms", &self.timeout_ms)
            .field("speed", &self.speed)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl SpeechConfig {
    /// Create a minimal config for testing
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err("speech.api_key is required".to_string());
        }

        if !(0.25..=4.0).contains(&self.speed) {
            return Err(format!(
                "Speed must be between 0.25 and 4.0, got {}",
                self.speed
            ));
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.max_input_chars == 0 || self.max_input_chars > OPENAI_MAX_INPUT_CHARS {
            return Err(format!(
                "max_input_chars must be between 1 and {OPENAI_MAX_INPUT_CHARS}, got {}",
                self.max_input_chars
            ));
        }

        Ok(())
    }
}
