//! Application state shared across handlers

use std::sync::Arc;

use application::{SpeechSynthesisPort, StoryGenerationPort, StoryPipeline};

use crate::middleware::IdentityResolver;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Story orchestration
    pub pipeline: Arc<StoryPipeline>,
    /// Story text provider, probed by readiness checks
    pub story_generator: Arc<dyn StoryGenerationPort>,
    /// Narration provider, probed by readiness checks
    pub narrator: Arc<dyn SpeechSynthesisPort>,
    /// Quota key and session id resolution
    pub identity: Arc<IdentityResolver>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
