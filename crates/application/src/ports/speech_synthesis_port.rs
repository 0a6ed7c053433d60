//! Speech synthesis port - Interface to the text-to-speech provider

use std::time::Duration;

use async_trait::async_trait;
use domain::{AudioFormat, LanguageCode};
#[cfg(test)]
use mockall::automock;

use crate::error::ProviderError;

/// Voice settings for one synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisVoice {
    /// Provider-side voice name
    pub provider_voice: String,
    /// Speaking rate (1.0 = provider default)
    pub speed: f32,
    pub language: LanguageCode,
}

/// Audio for one piece of text
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub format: AudioFormat,
    /// Duration reported by the provider, when known
    pub duration: Option<Duration>,
}

/// Port for text-to-speech
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// Synthesize `text`, which must not exceed [`Self::max_input_chars`]
    async fn synthesize(
        &self,
        text: String,
        voice: SynthesisVoice,
    ) -> Result<SynthesizedAudio, ProviderError>;

    /// Check if the provider is reachable
    async fn is_available(&self) -> bool;

    /// Longest text accepted by a single call, in characters
    fn max_input_chars(&self) -> usize;

    /// Format of the audio this provider returns
    fn output_format(&self) -> AudioFormat;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_speech_port() {
        let mut mock = MockSpeechSynthesisPort::new();
        mock.expect_synthesize().returning(|text, _| {
            Ok(SynthesizedAudio {
                audio: text.into_bytes(),
                format: AudioFormat::Mp3,
                duration: None,
            })
        });
        mock.expect_max_input_chars().return_const(4096usize);

        let voice = SynthesisVoice {
            provider_voice: "nova".to_string(),
            speed: 0.9,
            language: LanguageCode::english(),
        };
        let audio = mock.synthesize("abc".to_string(), voice).await.unwrap();
        assert_eq!(audio.audio, b"abc");
        assert_eq!(mock.max_input_chars(), 4096);
    }
}
