//! Narration voices offered to parents

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{LanguageCode, VoiceId};

/// One selectable narration voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub id: VoiceId,
    /// Label shown in the picker
    pub label: String,
    /// Voice name understood by the speech provider
    pub provider_voice: String,
    /// Speaking rate (1.0 = provider default)
    pub speed: f32,
    /// Languages this voice narrates; empty means all supported languages
    #[serde(default)]
    pub languages: Vec<LanguageCode>,
}

impl VoiceProfile {
    #[must_use]
    pub fn supports(&self, language: LanguageCode) -> bool {
        self.languages.is_empty() || self.languages.contains(&language)
    }
}

/// The set of voices a request may choose from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCatalog {
    voices: Vec<VoiceProfile>,
}

impl VoiceCatalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(voices: Vec<VoiceProfile>) -> Result<Self, DomainError> {
        if voices.is_empty() {
            return Err(DomainError::ValidationError(
                "voice catalog must not be empty".to_string(),
            ));
        }
        for (i, voice) in voices.iter().enumerate() {
            if voices[..i].iter().any(|v| v.id == voice.id) {
                return Err(DomainError::ValidationError(format!(
                    "duplicate voice id '{}'",
                    voice.id
                )));
            }
        }
        Ok(Self { voices })
    }

    pub fn voices(&self) -> &[VoiceProfile] {
        &self.voices
    }

    pub fn get(&self, id: &VoiceId) -> Option<&VoiceProfile> {
        self.voices.iter().find(|v| &v.id == id)
    }

    /// Find the voice and check it narrates `language`
    pub fn resolve(
        &self,
        id: &VoiceId,
        language: LanguageCode,
    ) -> Result<&VoiceProfile, DomainError> {
        let voice = self
            .get(id)
            .ok_or_else(|| DomainError::UnsupportedVoice(format!("unknown voice '{id}'")))?;

        if !voice.supports(language) {
            return Err(DomainError::UnsupportedLanguage(format!(
                "voice '{id}' does not narrate {}",
                language.display_name()
            )));
        }

        Ok(voice)
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        let voice = |id: &str, label: &str, provider_voice: &str, speed: f32| VoiceProfile {
            id: VoiceId::from_trusted(id),
            label: label.to_string(),
            provider_voice: provider_voice.to_string(),
            speed,
            languages: Vec::new(),
        };

        Self {
            voices: vec![
                voice("warm_female", "Warm female voice", "nova", 0.9),
                voice("friendly_male", "Friendly male voice", "echo", 0.9),
                voice("storyteller", "Gentle storyteller", "fable", 0.85),
            ],
        }
    }
}
