//! Story pipeline - Runs one story request from validation to audio
//!
//! Each request moves through [`PipelineStage`]s in order:
//! validating, quota check, composing, synthesizing, cleanup, done. Any
//! stage can end the request as failed. Validation runs before the quota
//! check, so malformed requests never consume a slot; once a slot is
//! reserved it stays consumed whatever happens afterwards. Temporary files
//! are released on every exit path, including cancellation.

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use domain::{
    DEFAULT_DAILY_LIMIT, Identity, PipelineStage, QuotaDecision, QuotaStatus, StoryArtifact,
    StoryRequest, VoiceCatalog, VoiceProfile,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::ApplicationError,
    services::{
        quota_tracker::QuotaTracker, speech_synthesizer::SpeechSynthesizer,
        story_composer::StoryComposer, story_workspace::StoryWorkspace,
    },
};

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stories per identity per UTC day
    pub daily_limit: u32,
    /// Parent directory for request workspaces (system temp dir if unset)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            scratch_dir: None,
        }
    }
}

/// A finished story together with what the caller needs to report
#[derive(Debug)]
pub struct GeneratedStory {
    pub job_id: Uuid,
    pub artifact: StoryArtifact,
    /// Stories left today after this one
    pub remaining_today: u32,
    pub elapsed: Duration,
}

/// Request-scoped state; never shared between requests
struct StoryJob {
    id: Uuid,
    stage: PipelineStage,
    workspace: Option<StoryWorkspace>,
    started: Instant,
}

impl StoryJob {
    fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            stage: PipelineStage::Validating,
            workspace: None,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        if !self.stage.can_advance_to(&next) {
            warn!(job = %self.id, from = %self.stage, to = %next, "Unexpected stage transition");
        }
        debug!(job = %self.id, from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }

    /// Release the workspace; safe to call on any path
    fn cleanup(&mut self) {
        if matches!(
            self.stage,
            PipelineStage::QuotaCheck | PipelineStage::Composing | PipelineStage::Synthesizing
        ) {
            self.advance(PipelineStage::Cleanup);
        }
        if let Some(workspace) = self.workspace.take() {
            workspace.release();
        }
    }
}

impl Drop for StoryJob {
    fn drop(&mut self) {
        if !self.stage.is_terminal() {
            // The workspace's own drop removes the files.
            warn!(job = %self.id, stage = %self.stage, "Story request abandoned before completion");
        }
    }
}

/// Orchestrates quota, composition and synthesis for story requests
pub struct StoryPipeline {
    quota: Arc<QuotaTracker>,
    composer: Arc<StoryComposer>,
    synthesizer: Arc<SpeechSynthesizer>,
    catalog: Arc<VoiceCatalog>,
    config: PipelineConfig,
}

impl fmt::Debug for StoryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryPipeline")
            .field("config", &self.config)
            .field("voices", &self.catalog.voices().len())
            .finish_non_exhaustive()
    }
}

impl StoryPipeline {
    pub fn new(
        quota: Arc<QuotaTracker>,
        composer: Arc<StoryComposer>,
        synthesizer: Arc<SpeechSynthesizer>,
        catalog: Arc<VoiceCatalog>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            quota,
            composer,
            synthesizer,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub const fn daily_limit(&self) -> u32 {
        self.config.daily_limit
    }

    /// Today's quota usage for `identity` without reserving anything
    pub async fn quota_status(&self, identity: &Identity) -> Result<QuotaStatus, ApplicationError> {
        self.quota.status(identity, self.config.daily_limit).await
    }

    /// Produce a narrated story for `request` on behalf of `identity`
    #[instrument(skip(self, request), fields(
        identity = %identity,
        age_group = %request.age_group(),
        voice = %request.voice_id()
    ))]
    pub async fn generate(
        &self,
        request: &StoryRequest,
        identity: &Identity,
    ) -> Result<GeneratedStory, ApplicationError> {
        let mut job = StoryJob::new();
        info!(job = %job.id, "Story request received");

        let result = self.run(&mut job, request, identity).await;
        job.cleanup();

        match result {
            Ok((artifact, remaining_today)) => {
                job.advance(PipelineStage::Done);
                let elapsed = job.started.elapsed();
                info!(
                    job = %job.id,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    duration = %artifact.duration_label(),
                    "Story delivered"
                );
                Ok(GeneratedStory {
                    job_id: job.id,
                    artifact,
                    remaining_today,
                    elapsed,
                })
            },
            Err(err) => {
                job.advance(PipelineStage::Failed(err.kind()));
                warn!(job = %job.id, kind = %err.kind(), error = %err, "Story request failed");
                Err(err)
            },
        }
    }

    async fn run(
        &self,
        job: &mut StoryJob,
        request: &StoryRequest,
        identity: &Identity,
    ) -> Result<(StoryArtifact, u32), ApplicationError> {
        let voice = self.validate(request)?;

        job.advance(PipelineStage::QuotaCheck);
        let remaining = match self
            .quota
            .check_and_reserve(identity, self.config.daily_limit)
            .await?
        {
            QuotaDecision::Allowed { remaining, .. } => remaining,
            QuotaDecision::Denied { resets_at } => {
                return Err(ApplicationError::QuotaExceeded { resets_at });
            },
        };

        job.advance(PipelineStage::Composing);
        job.workspace = Some(StoryWorkspace::create(self.config.scratch_dir.as_deref())?);
        let story = self.composer.compose(request).await?;

        job.advance(PipelineStage::Synthesizing);
        let workspace = job
            .workspace
            .as_ref()
            .ok_or_else(|| ApplicationError::Internal("story workspace missing".to_string()))?;
        let artifact = self
            .synthesizer
            .synthesize(&story, &voice, request, workspace)
            .await?;

        Ok((artifact, remaining))
    }

    fn validate(&self, request: &StoryRequest) -> Result<VoiceProfile, ApplicationError> {
        let voice = self
            .catalog
            .resolve(request.voice_id(), request.language())?
            .clone();
        debug!(provider_voice = %voice.provider_voice, "Request validated");
        Ok(voice)
    }
}
