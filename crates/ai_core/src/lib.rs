//! AI Core - Story text generation
//!
//! Client for OpenAI-compatible chat-completions APIs (Groq by default).
//! Failures are classified so callers can tell transient outages from
//! refused requests and filtered content.

pub mod config;
pub mod error;
pub mod openai;
pub mod ports;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use openai::OpenAiCompatibleEngine;
pub use ports::{InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse, TokenUsage};
