//! Story theme value object

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::DomainError;

/// Maximum length of a custom theme, in characters
pub const MAX_THEME_CHARS: usize = 60;

/// Themes offered in the picker
pub const PRESET_THEMES: [&str; 9] = [
    "Pirates & Treasure",
    "Space Adventure",
    "Dinosaur Discovery",
    "Princess & Castle",
    "Animals & Safari",
    "Underwater World",
    "Superheroes",
    "Magic & Wizards",
    "Robots & Inventions",
];

/// A story theme: either a preset or short free text
///
/// # Examples
///
/// ```
/// use domain::Theme;
///
/// let preset = Theme::new("space adventure").unwrap();
/// assert!(preset.is_preset());
/// assert_eq!(preset.as_str(), "Space Adventure");
///
/// let custom = Theme::new("A picnic with friendly bees").unwrap();
/// assert!(!custom.is_preset());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Theme {
    /// One of [`PRESET_THEMES`]
    Preset(&'static str),
    /// Parent-supplied theme text
    Custom(String),
}

impl Theme {
    /// Resolve a preset (case-insensitive) or accept free text
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTheme`] if the text is empty or longer
    /// than 60 characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let cleaned: String = raw
            .as_ref()
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if cleaned.is_empty() {
            return Err(DomainError::InvalidTheme("theme is required".to_string()));
        }

        if let Some(preset) = PRESET_THEMES
            .iter()
            .find(|p| p.eq_ignore_ascii_case(&cleaned))
        {
            return Ok(Self::Preset(preset));
        }

        let length = cleaned.chars().count();
        if length > MAX_THEME_CHARS {
            return Err(DomainError::InvalidTheme(format!(
                "custom theme must be at most {MAX_THEME_CHARS} characters, got {length}"
            )));
        }

        Ok(Self::Custom(cleaned))
    }

    /// Theme text as used in the prompt
    pub fn as_str(&self) -> &str {
        match self {
            Self::Preset(name) => name,
            Self::Custom(text) => text,
        }
    }

    /// Whether this is one of the predefined themes
    #[must_use]
    pub const fn is_preset(&self) -> bool {
        matches!(self, Self::Preset(_))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Theme {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// Parsed from an owned string; preset entries borrow from the static table.
impl<'de> Deserialize<'de> for Theme {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.as_str().to_string()
    }
}
