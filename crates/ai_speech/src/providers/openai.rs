//! OpenAI Speech Provider
//!
//! Implements `TextToSpeech` against `POST {base_url}/audio/speech`.
//! Output formats: mp3, opus, aac, flac, wav.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::ports::{SynthesisOptions, TextToSpeech};
use crate::types::{AudioData, AudioFormat};

/// OpenAI-compatible text-to-speech provider
#[derive(Debug, Clone)]
pub struct OpenAISpeechProvider {
    client: Client,
    config: SpeechConfig,
}

impl OpenAISpeechProvider {
    /// Create a new OpenAI speech provider
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SpeechError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Get the API key
    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    /// Build the TTS endpoint URL
    fn tts_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }

    /// Speed to send; omitted when it equals the provider default
    fn effective_speed(&self, options: &SynthesisOptions) -> Option<f32> {
        let speed = options.speed.unwrap_or(self.config.speed).clamp(0.25, 4.0);
        if (speed - 1.0).abs() < f32::EPSILON {
            None
        } else {
            Some(speed)
        }
    }

    fn classify_failure(&self, status: StatusCode, body: &str, voice: &str) -> SpeechError {
        if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
            match api_error.error.code.as_deref() {
                Some("rate_limit_exceeded") => return SpeechError::RateLimited,
                Some("model_not_found") => {
                    return SpeechError::ModelNotAvailable(self.config.tts_model.clone());
                },
                Some("invalid_voice") => return SpeechError::VoiceNotFound(voice.to_string()),
                _ => {},
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                return SpeechError::RateLimited;
            }
            if status.is_server_error() {
                return SpeechError::ServiceUnavailable(api_error.error.message);
            }
            return SpeechError::SynthesisFailed(api_error.error.message);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            SpeechError::RateLimited
        } else if status.is_server_error() {
            SpeechError::ServiceUnavailable(format!("HTTP {status}: {body}"))
        } else {
            SpeechError::SynthesisFailed(format!("HTTP {status}: {body}"))
        }
    }
}

/// OpenAI TTS request body
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait]
impl TextToSpeech for OpenAISpeechProvider {
    #[instrument(skip(self, text, options), fields(text_chars = text.chars().count(), voice = ?options.voice))]
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioData, SpeechError> {
        debug!("Synthesizing speech");

        if text.trim().is_empty() {
            return Err(SpeechError::SynthesisFailed(
                "Text cannot be empty".to_string(),
            ));
        }

        let chars = text.chars().count();
        if chars > self.config.max_input_chars {
            return Err(SpeechError::TextTooLong {
                chars,
                max: self.config.max_input_chars,
            });
        }

        let voice = options
            .voice
            .as_deref()
            .unwrap_or(&self.config.default_voice);
        let format = options.format.unwrap_or(self.config.output_format);

        let request = TtsRequest {
            model: &self.config.tts_model,
            input: text,
            voice,
            response_format: format.response_format(),
            speed: self.effective_speed(options),
        };

        let response = self
            .client
            .post(self.tts_url())
            .bearer_auth(self.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::from_transport(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Speech synthesis request failed");
            return Err(self.classify_failure(status, &error_body, voice));
        }

        let audio_bytes: Bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {e}")))?;

        if audio_bytes.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "Provider returned empty audio".to_string(),
            ));
        }

        debug!(audio_size = audio_bytes.len(), "Speech synthesis complete");

        Ok(AudioData::new(audio_bytes.to_vec(), format))
    }

    async fn is_available(&self) -> bool {
        let models_url = format!("{}/models", self.config.base_url.trim_end_matches('/'));

        match self
            .client
            .get(&models_url)
            .bearer_auth(self.api_key())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("TTS availability check failed: {}", e);
                false
            },
        }
    }

    fn model_name(&self) -> &str {
        &self.config.tts_model
    }

    fn default_voice(&self) -> &str {
        &self.config.default_voice
    }

    fn max_input_chars(&self) -> usize {
        self.config.max_input_chars
    }

    fn output_format(&self) -> AudioFormat {
        self.config.output_format
    }
}
