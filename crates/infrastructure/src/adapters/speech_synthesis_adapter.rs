//! Speech synthesis adapter - Implements SpeechSynthesisPort using ai_speech

use std::time::Duration;

use ai_speech::{
    AudioFormat as SpeechFormat, OpenAISpeechProvider, SpeechConfig, SpeechError,
    SynthesisOptions, TextToSpeech,
};
use application::{
    error::{ApplicationError, ProviderError},
    ports::{SpeechSynthesisPort, SynthesisVoice, SynthesizedAudio},
};
use async_trait::async_trait;
use domain::AudioFormat;
use tracing::{debug, instrument};

/// Adapter for text-to-speech using the ai_speech crate
#[derive(Debug)]
pub struct SpeechSynthesisAdapter<P = OpenAISpeechProvider> {
    provider: P,
}

impl SpeechSynthesisAdapter {
    /// Create a new speech adapter
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to initialize.
    pub fn new(config: SpeechConfig) -> Result<Self, ApplicationError> {
        if !to_domain_format(config.output_format).is_some_and(|f| f.is_concatenable()) {
            return Err(ApplicationError::Configuration(format!(
                "speech.output_format '{}' cannot be stitched; use mp3 or wav",
                config.output_format.extension()
            )));
        }
        let provider = OpenAISpeechProvider::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self { provider })
    }
}

/// Convert ai_speech AudioFormat to domain AudioFormat
const fn to_domain_format(format: SpeechFormat) -> Option<AudioFormat> {
    match format {
        SpeechFormat::Mp3 => Some(AudioFormat::Mp3),
        SpeechFormat::Wav => Some(AudioFormat::Wav),
        SpeechFormat::Opus => Some(AudioFormat::Opus),
        SpeechFormat::Flac | SpeechFormat::M4a => None,
    }
}

impl<P: TextToSpeech> SpeechSynthesisAdapter<P> {
    /// Wrap an existing provider
    pub const fn with_provider(provider: P) -> Self {
        Self { provider }
    }

    /// Map speech error to provider error
    fn map_error(err: SpeechError) -> ProviderError {
        match err {
            SpeechError::Timeout(ms) => ProviderError::Timeout(ms),
            SpeechError::RateLimited => {
                ProviderError::Unavailable("speech rate limit reached".to_string())
            },
            SpeechError::ConnectionFailed(msg) | SpeechError::ServiceUnavailable(msg) => {
                ProviderError::Unavailable(msg)
            },
            SpeechError::InvalidResponse(msg) => ProviderError::InvalidResponse(msg),
            other @ (SpeechError::RequestFailed(_)
            | SpeechError::TextTooLong { .. }
            | SpeechError::SynthesisFailed(_)
            | SpeechError::Configuration(_)
            | SpeechError::VoiceNotFound(_)
            | SpeechError::ModelNotAvailable(_)) => ProviderError::Rejected(other.to_string()),
        }
    }
}

#[async_trait]
impl<P: TextToSpeech> SpeechSynthesisPort for SpeechSynthesisAdapter<P> {
    #[instrument(skip(self, text), fields(text_chars = text.chars().count(), voice = %voice.provider_voice))]
    async fn synthesize(
        &self,
        text: String,
        voice: SynthesisVoice,
    ) -> Result<SynthesizedAudio, ProviderError> {
        let options = SynthesisOptions::voice(voice.provider_voice).with_speed(voice.speed);

        let audio = self
            .provider
            .synthesize(&text, &options)
            .await
            .map_err(Self::map_error)?;

        debug!(bytes = audio.size_bytes(), "Chunk audio received");

        let format = to_domain_format(audio.format()).ok_or_else(|| {
            ProviderError::InvalidResponse(format!(
                "unsupported audio format '{}'",
                audio.format().extension()
            ))
        })?;
        let duration = audio.duration_ms().map(Duration::from_millis);
        Ok(SynthesizedAudio {
            audio: audio.into_data(),
            format,
            duration,
        })
    }

    async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    fn max_input_chars(&self) -> usize {
        self.provider.max_input_chars()
    }

    fn output_format(&self) -> AudioFormat {
        to_domain_format(self.provider.output_format()).unwrap_or_default()
    }
}
