//! Story language value object

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::DomainError;

/// Supported story languages: ISO 639-1 code and prompt display name
pub const SUPPORTED_LANGUAGES: [(&str, &str); 25] = [
    ("en", "English"),
    ("es", "Spanish (Español)"),
    ("fr", "French (Français)"),
    ("de", "German (Deutsch)"),
    ("it", "Italian (Italiano)"),
    ("pt", "Portuguese (Português)"),
    ("nl", "Dutch (Nederlands)"),
    ("pl", "Polish (Polski)"),
    ("ru", "Russian (Русский)"),
    ("ja", "Japanese (日本語)"),
    ("zh", "Chinese (中文)"),
    ("ko", "Korean (한국어)"),
    ("ar", "Arabic (العربية)"),
    ("hi", "Hindi (हिन्दी)"),
    ("tr", "Turkish (Türkçe)"),
    ("sv", "Swedish (Svenska)"),
    ("da", "Danish (Dansk)"),
    ("no", "Norwegian (Norsk)"),
    ("fi", "Finnish (Suomi)"),
    ("cs", "Czech (Čeština)"),
    ("el", "Greek (Ελληνικά)"),
    ("he", "Hebrew (עברית)"),
    ("hu", "Hungarian (Magyar)"),
    ("ro", "Romanian (Română)"),
    ("uk", "Ukrainian (Українська)"),
];

/// A supported story language
///
/// # Examples
///
/// ```
/// use domain::LanguageCode;
///
/// let lang = LanguageCode::new("DE").unwrap();
/// assert_eq!(lang.as_str(), "de");
/// assert_eq!(lang.display_name(), "German (Deutsch)");
/// assert!(LanguageCode::new("xx").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct LanguageCode {
    code: &'static str,
    name: &'static str,
}

impl LanguageCode {
    /// Look up a supported language by code
    ///
    /// Region suffixes (`en-US`, `pt_BR`) are ignored.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        let primary = normalized
            .split(['-', '_'])
            .next()
            .unwrap_or_default();

        SUPPORTED_LANGUAGES
            .iter()
            .find(|(code, _)| *code == primary)
            .map(|(code, name)| Self { code, name })
            .ok_or_else(|| {
                DomainError::UnsupportedLanguage(format!("'{}' is not supported", raw.as_ref()))
            })
    }

    /// English, the default story language
    #[must_use]
    pub const fn english() -> Self {
        Self {
            code: "en",
            name: "English",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.code
    }

    /// Name used when instructing the generator
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_english(&self) -> bool {
        self.code == "en"
    }

    /// Every supported language
    pub fn all() -> impl Iterator<Item = Self> {
        SUPPORTED_LANGUAGES
            .iter()
            .map(|(code, name)| Self { code, name })
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// Parsed from an owned string; preset entries borrow from the static table.
impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl From<LanguageCode> for String {
    fn from(lang: LanguageCode) -> Self {
        lang.code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_suffix_is_ignored() {
        assert_eq!(LanguageCode::new("pt_BR").unwrap().as_str(), "pt");
        assert_eq!(LanguageCode::new("en-GB").unwrap(), LanguageCode::english());
    }

    #[test]
    fn unknown_code_rejected() {
        assert!(matches!(
            LanguageCode::new("tlh"),
            Err(DomainError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn all_lists_every_language() {
        assert_eq!(LanguageCode::all().count(), SUPPORTED_LANGUAGES.len());
        assert!(LanguageCode::all().any(|l| l.as_str() == "uk"));
    }

    #[test]
    fn deserializes_from_code() {
        let lang: LanguageCode = serde_json::from_str("\"fr-CA\"").unwrap();
        assert_eq!(lang.as_str(), "fr");
        assert_eq!(serde_json::to_string(&lang).unwrap(), "\"fr\"");
        assert!(serde_json::from_str::<LanguageCode>("\"xx\"").is_err());
    }
}
