//! Inference errors

use thiserror::Error;

/// Errors that can occur during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to connect to inference server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to inference server failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Model not found or not loaded
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response parsing failed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout during inference
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Request refused by the server (4xx)
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Output blocked by the provider's content filter
    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    /// Engine misconfigured (missing key, out-of-range setting)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl InferenceError {
    /// Whether the same request may succeed later
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::RateLimited | Self::ServerError(_)
        )
    }
}

impl InferenceError {
    /// Classify a transport failure; `timeout_ms` is the client's limit
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
