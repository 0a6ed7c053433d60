//! Port definition for text-to-speech providers

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::types::{AudioData, AudioFormat};

/// Per-call synthesis settings; unset fields fall back to provider config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisOptions {
    pub voice: Option<String>,
    /// Speaking rate (0.25 to 4.0)
    pub speed: Option<f32>,
    pub format: Option<AudioFormat>,
}

impl SynthesisOptions {
    /// Options selecting only a voice
    pub fn voice(voice: impl Into<String>) -> Self {
        Self {
            voice: Some(voice.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }
}

/// Port for text-to-speech implementations
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Convert `text` to speech
    ///
    /// `text` must not exceed [`Self::max_input_chars`] characters.
    async fn synthesize(&self, text: &str, options: &SynthesisOptions)
    -> Result<AudioData, SpeechError>;

    /// Check if the service is reachable
    async fn is_available(&self) -> bool;

    /// Name of the TTS model
    fn model_name(&self) -> &str;

    /// Voice used when the options do not name one
    fn default_voice(&self) -> &str;

    /// Longest text accepted by one call, in characters
    fn max_input_chars(&self) -> usize;

    /// Format returned when the options do not name one
    fn output_format(&self) -> AudioFormat;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_options() {
        let options = SynthesisOptions::voice("fable").with_speed(0.85);
        assert_eq!(options.voice.as_deref(), Some("fable"));
        assert_eq!(options.speed, Some(0.85));
        assert!(options.format.is_none());
    }
}
