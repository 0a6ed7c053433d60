//! Application layer - Use cases and orchestration
//!
//! Holds the story pipeline and its collaborators (quota tracker, composer,
//! speech synthesizer), the ports they depend on, and the shared retry
//! policy. Infrastructure adapters implement the ports.

pub mod error;
pub mod ports;
pub mod retry;
pub mod services;

pub use error::{ApplicationError, ProviderError};
pub use ports::*;
pub use retry::{RetryOutcome, RetryPolicy, Retryable};
pub use services::*;
