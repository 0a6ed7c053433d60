//! AI Speech - Text-to-Speech for story narration
//!
//! Provides the `TextToSpeech` port and an OpenAI-compatible implementation
//! (`POST {base_url}/audio/speech`).
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{OpenAISpeechProvider, SpeechConfig, SynthesisOptions, TextToSpeech};
//!
//! let provider = OpenAISpeechProvider::new(config)?;
//! let audio = provider
//!     .synthesize("Once upon a time...", &SynthesisOptions::voice("fable"))
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod ports;
pub mod providers;
pub mod types;

pub use config::SpeechConfig;
pub use error::SpeechError;
pub use ports::{SynthesisOptions, TextToSpeech};
pub use providers::openai::OpenAISpeechProvider;
pub use types::{AudioData, AudioFormat};
