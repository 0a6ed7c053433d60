//! Application-level errors

use chrono::{DateTime, Utc};
use domain::{DomainError, FailureKind};
use thiserror::Error;

use crate::retry::Retryable;

/// Failure reported by a text or speech provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network failure, 5xx or rate limiting
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// No answer within the allotted time (milliseconds)
    #[error("Provider timed out after {0}ms")]
    Timeout(u64),

    /// Request refused (4xx other than rate limiting)
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    /// Output blocked by the provider's content filter
    #[error("Content filtered by provider: {0}")]
    ContentFiltered(String),

    /// Answer could not be used
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Invalid request field
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Request rejected before any work was done
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Daily story limit reached
    #[error("Daily story quota exceeded, resets at {resets_at}")]
    QuotaExceeded { resets_at: DateTime<Utc> },

    /// Provider failure that survived the retry policy
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The generator refused the story content
    #[error("Content policy violation: {0}")]
    ContentPolicy(String),

    /// Audio could not be produced for the whole story
    #[error("Audio synthesis failed{}: {reason}", chunk.map(|c| format!(" for chunk {c}")).unwrap_or_default())]
    Synthesis { chunk: Option<usize>, reason: String },

    /// Quota store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Category used for pipeline state and user messages
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Domain(_) | Self::Validation(_) => FailureKind::Validation,
            Self::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            Self::Provider(_) => FailureKind::Provider,
            Self::ContentPolicy(_) => FailureKind::ContentPolicy,
            Self::Synthesis { .. } => FailureKind::Synthesis,
            Self::Storage(_) | Self::Configuration(_) | Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Synthesis failure helper
    pub fn synthesis(chunk: Option<usize>, reason: impl Into<String>) -> Self {
        Self::Synthesis {
            chunk,
            reason: reason.into(),
        }
    }
}

impl Retryable for ApplicationError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(err) => err.is_retryable(),
            _ => false,
        }
    }
}
