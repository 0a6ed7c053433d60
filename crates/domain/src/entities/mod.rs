//! Domain entities

mod audio;
mod pipeline_stage;
mod quota;
mod story_request;
mod story_text;
mod voice;

pub use audio::{AudioChunk, AudioFormat, StoryArtifact, TextChunk};
pub use pipeline_stage::{FailureKind, PipelineStage};
pub use quota::{DEFAULT_DAILY_LIMIT, QuotaDecision, QuotaRecord, QuotaStatus, next_reset};
pub use story_request::StoryRequest;
pub use story_text::{
    NARRATION_WORDS_PER_MINUTE, StoryText, estimate_narration, is_sentence_terminator,
    sentence_boundaries,
};
pub use voice::{VoiceCatalog, VoiceProfile};
