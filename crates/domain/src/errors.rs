//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Child name empty or too long after sanitizing
    #[error("Invalid child name: {0}")]
    InvalidChildName(String),

    /// Unknown age group
    #[error("Invalid age group: {0}")]
    InvalidAgeGroup(String),

    /// Theme missing or too long
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    /// Voice identifier malformed or not in the catalog
    #[error("Unsupported voice: {0}")]
    UnsupportedVoice(String),

    /// Language code malformed or not supported
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Identity key missing
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Field name the error refers to, for user-facing messages
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidChildName(_) => "child_name",
            Self::InvalidAgeGroup(_) => "age_group",
            Self::InvalidTheme(_) => "theme",
            Self::UnsupportedVoice(_) => "voice",
            Self::UnsupportedLanguage(_) => "language",
            Self::InvalidIdentity(_) => "identity",
            Self::ValidationError(_) => "request",
        }
    }
}
