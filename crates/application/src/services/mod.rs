//! Application services - Use case implementations

mod audio_stitcher;
mod quota_tracker;
mod speech_synthesizer;
mod story_composer;
mod story_pipeline;
mod story_prompt;
mod story_workspace;
#[cfg(test)]
pub(crate) mod test_support;
mod text_chunker;

pub use audio_stitcher::{AudioStitcher, StitchError, audio_duration, mp3_duration, wav_duration};
pub use quota_tracker::QuotaTracker;
pub use speech_synthesizer::{SpeechSynthesizer, SynthesizerConfig};
pub use story_composer::{ComposerConfig, StoryComposer};
pub use story_pipeline::{GeneratedStory, PipelineConfig, StoryPipeline};
pub use story_prompt::{STORYTELLER_SYSTEM_PROMPT, StoryPrompt};
pub use story_workspace::StoryWorkspace;
pub use text_chunker::split_into_chunks;
