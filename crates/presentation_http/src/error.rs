//! API error handling
//!
//! Every failure category gets its own status, machine-readable code and a
//! message a parent can act on. Provider and internal details are only
//! included while internal error exposure is enabled (development).

use std::sync::atomic::{AtomicBool, Ordering};

use application::ApplicationError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Global flag to control error detail exposure
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Configure whether internal error details are included in responses
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

fn should_expose_details() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request field failed validation
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Daily story limit reached
    #[error("Quota exceeded until {resets_at}")]
    QuotaExceeded {
        resets_at: DateTime<Utc>,
        daily_limit: Option<u32>,
    },

    /// Story text was refused by the generator
    #[error("Content policy: {0}")]
    ContentPolicy(String),

    /// Story provider timed out
    #[error("Provider timeout: {0}")]
    ProviderTimeout(String),

    /// Story provider unavailable or refused the request
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Narration could not be produced
    #[error("Narration failed: {0}")]
    Synthesis(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable code
    pub code: String,
    /// Offending request field for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Start of the next quota day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            field: None,
            resets_at: None,
            details: None,
        }
    }

    fn with_details(mut self, details: &str) -> Self {
        if should_expose_details() {
            self.details = Some(details.to_string());
        }
        self
    }
}

impl ApiError {
    /// Fill in the configured limit for the quota message
    #[must_use]
    pub fn with_daily_limit(self, limit: u32) -> Self {
        match self {
            Self::QuotaExceeded { resets_at, .. } => Self::QuotaExceeded {
                resets_at,
                daily_limit: Some(limit),
            },
            other => other,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ContentPolicy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Synthesis(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Seconds until `resets_at`, never less than one
fn retry_after_secs(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (resets_at - now).num_seconds().max(1)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut retry_after = None;

        let body = match &self {
            Self::Validation { field, message } => ErrorResponse {
                field: Some(field.clone()),
                ..ErrorResponse::new("validation_error", message.clone())
            },
            Self::QuotaExceeded {
                resets_at,
                daily_limit,
            } => {
                retry_after = Some(retry_after_secs(*resets_at, Utc::now()));
                let message = match daily_limit {
                    Some(limit) => format!(
                        "You've created {limit} stories today! Come back tomorrow for more magical adventures."
                    ),
                    None => "You've used all of today's stories! Come back tomorrow for more magical adventures."
                        .to_string(),
                };
                ErrorResponse {
                    resets_at: Some(*resets_at),
                    ..ErrorResponse::new("quota_exceeded", message)
                }
            },
            Self::ContentPolicy(reason) => ErrorResponse::new(
                "content_policy",
                "We couldn't write a story for that request. Please try a different theme.",
            )
            .with_details(reason),
            Self::ProviderTimeout(reason) => ErrorResponse::new(
                "story_timeout",
                "The storyteller took too long to answer. Please try again.",
            )
            .with_details(reason),
            Self::ProviderUnavailable(reason) => ErrorResponse::new(
                "story_unavailable",
                "The storyteller is busy right now. Please try again in a few minutes.",
            )
            .with_details(reason),
            Self::Synthesis(reason) => ErrorResponse::new(
                "narration_failed",
                "Your story was written but the narration could not be recorded. Please try again.",
            )
            .with_details(reason),
            Self::Internal(reason) => {
                ErrorResponse::new("internal_error", "An internal error occurred")
                    .with_details(reason)
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let field = err.field().to_string();
        let message = match err {
            DomainError::InvalidChildName(m)
            | DomainError::InvalidAgeGroup(m)
            | DomainError::InvalidTheme(m)
            | DomainError::UnsupportedVoice(m)
            | DomainError::UnsupportedLanguage(m)
            | DomainError::InvalidIdentity(m)
            | DomainError::ValidationError(m) => m,
        };
        Self::Validation { field, message }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        use application::ProviderError;

        match err {
            ApplicationError::Domain(e) => e.into(),
            ApplicationError::Validation(message) => Self::Validation {
                field: "request".to_string(),
                message,
            },
            ApplicationError::QuotaExceeded { resets_at } => Self::QuotaExceeded {
                resets_at,
                daily_limit: None,
            },
            ApplicationError::ContentPolicy(reason)
            | ApplicationError::Provider(ProviderError::ContentFiltered(reason)) => {
                Self::ContentPolicy(reason)
            },
            ApplicationError::Provider(e @ ProviderError::Timeout(_)) => {
                Self::ProviderTimeout(e.to_string())
            },
            ApplicationError::Provider(e) => Self::ProviderUnavailable(e.to_string()),
            e @ ApplicationError::Synthesis { .. } => Self::Synthesis(e.to_string()),
            ApplicationError::Storage(msg)
            | ApplicationError::Configuration(msg)
            | ApplicationError::Internal(msg) => Self::Internal(msg),
        }
    }
}
