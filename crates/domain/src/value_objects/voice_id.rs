//! Voice identifier value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Catalog key of a narration voice, e.g. `warm_female`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoiceId(String);

impl VoiceId {
    /// Validate a voice key: 1-64 characters of `[a-z0-9_-]`
    ///
    /// Input is trimmed and lower-cased first.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = raw.as_ref().trim().to_lowercase();

        if value.is_empty() || value.len() > 64 {
            return Err(DomainError::UnsupportedVoice(format!(
                "voice id must be 1-64 characters, got '{value}'"
            )));
        }

        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(DomainError::UnsupportedVoice(format!(
                "voice id '{value}' contains invalid characters"
            )));
        }

        Ok(Self(value))
    }

    /// Wrap a key known to be valid (built-in catalog entries)
    pub(crate) fn from_trusted(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VoiceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoiceId> for String {
    fn from(id: VoiceId) -> Self {
        id.0
    }
}
