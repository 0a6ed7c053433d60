//! Infrastructure adapters
//!
//! Adapters connect application ports to the provider clients in `ai_core`
//! and `ai_speech`.

mod speech_synthesis_adapter;
mod story_generation_adapter;

pub use speech_synthesis_adapter::SpeechSynthesisAdapter;
pub use story_generation_adapter::StoryGenerationAdapter;
