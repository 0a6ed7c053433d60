//! Speech synthesizer - Narrates a story in provider-sized chunks
//!
//! The story is split at sentence boundaries, chunks are synthesized with
//! bounded parallelism, and the results are stitched back together in text
//! order regardless of which chunk finished first. A chunk that still fails
//! after its retries fails the whole story; partial audio is never returned.

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use domain::{
    AudioFormat, StoryArtifact, StoryRequest, StoryText, TextChunk, VoiceProfile,
    estimate_narration,
};
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{ApplicationError, ProviderError},
    ports::{SpeechSynthesisPort, SynthesisVoice},
    retry::RetryPolicy,
    services::{
        audio_stitcher::{AudioStitcher, audio_duration},
        story_workspace::StoryWorkspace,
        text_chunker::split_into_chunks,
    },
};

/// Configuration for chunked synthesis
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    /// Chunks synthesized at the same time
    pub max_parallel_chunks: usize,
    /// Preferred chunk size; the provider maximum still applies
    pub max_chunk_chars: usize,
    /// Upper bound for one synthesis call
    pub chunk_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            max_parallel_chunks: 3,
            max_chunk_chars: 2000,
            chunk_timeout: Duration::from_secs(45),
            retry: RetryPolicy::synthesis(),
        }
    }
}

/// Chunk audio waiting on disk for the merge
#[derive(Debug)]
struct SpooledChunk {
    index: usize,
    path: PathBuf,
    format: AudioFormat,
    duration: Duration,
}

/// Service that turns story text into one audio file
pub struct SpeechSynthesizer {
    speech: Arc<dyn SpeechSynthesisPort>,
    config: SynthesizerConfig,
}

impl fmt::Debug for SpeechSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSynthesizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpeechSynthesizer {
    pub fn new(speech: Arc<dyn SpeechSynthesisPort>) -> Self {
        Self::with_config(speech, SynthesizerConfig::default())
    }

    pub fn with_config(speech: Arc<dyn SpeechSynthesisPort>, config: SynthesizerConfig) -> Self {
        Self { speech, config }
    }

    /// Effective chunk limit: the smaller of provider and configured maximum
    pub fn chunk_limit(&self) -> usize {
        self.speech
            .max_input_chars()
            .min(self.config.max_chunk_chars)
            .max(1)
    }

    /// Narrate `story` with `voice`, spooling chunk audio in `workspace`
    #[instrument(skip_all, fields(
        voice = %voice.id,
        language = %request.language(),
        age_group = %request.age_group()
    ))]
    pub async fn synthesize(
        &self,
        story: &StoryText,
        voice: &VoiceProfile,
        request: &StoryRequest,
        workspace: &StoryWorkspace,
    ) -> Result<StoryArtifact, ApplicationError> {
        let limit = self.chunk_limit();
        let chunks = split_into_chunks(story.as_str(), limit);
        if chunks.is_empty() {
            return Err(ApplicationError::synthesis(None, "story has no text to narrate"));
        }

        let chunk_count = chunks.len();
        let parallelism = self.config.max_parallel_chunks.max(1);
        info!(chunk_count, limit, parallelism, "Synthesizing story audio");

        let synthesis_voice = SynthesisVoice {
            provider_voice: voice.provider_voice.clone(),
            speed: voice.speed,
            language: request.language(),
        };

        // Dropping the stream on the first error cancels chunks still in flight.
        let mut spooled: Vec<SpooledChunk> = stream::iter(chunks)
            .map(|chunk| self.synthesize_chunk(chunk, &synthesis_voice, workspace))
            .buffer_unordered(parallelism)
            .try_collect()
            .await?;
        spooled.sort_by_key(|chunk| chunk.index);

        let (audio, format, duration) = Self::merge(&spooled, workspace).await?;

        let band = request.age_group().duration_band();
        if band.contains(duration) {
            debug!(duration_secs = duration.as_secs(), "Duration within expected band");
        } else {
            warn!(
                duration_secs = duration.as_secs(),
                expected = %band.describe(),
                "Story duration outside the age group's band"
            );
        }

        info!(
            chunk_count,
            bytes = audio.len(),
            duration_secs = duration.as_secs(),
            format = %format,
            "Story audio ready"
        );

        Ok(StoryArtifact {
            file_name: StoryArtifact::file_name_for(request.child_name(), request.theme(), format),
            audio,
            format,
            duration,
            chunk_count,
        })
    }

    async fn synthesize_chunk(
        &self,
        chunk: TextChunk,
        voice: &SynthesisVoice,
        workspace: &StoryWorkspace,
    ) -> Result<SpooledChunk, ApplicationError> {
        let timeout = self.config.chunk_timeout;
        let outcome = self
            .config
            .retry
            .run(|| {
                let speech = Arc::clone(&self.speech);
                let text = chunk.text.clone();
                let voice = voice.clone();
                async move { synthesize_within(speech.as_ref(), text, voice, timeout).await }
            })
            .await;
        let attempts = outcome.attempts;

        let audio = outcome.into_result().map_err(|err| {
            warn!(chunk = chunk.index, attempts, error = %err, "Chunk synthesis failed");
            ApplicationError::synthesis(Some(chunk.index), err.to_string())
        })?;

        if audio.audio.is_empty() {
            return Err(ApplicationError::synthesis(
                Some(chunk.index),
                "provider returned no audio",
            ));
        }

        let words = chunk.text.split_whitespace().count();
        let duration = audio
            .duration
            .or_else(|| audio_duration(audio.format, &audio.audio))
            .unwrap_or_else(|| {
                debug!(chunk = chunk.index, words, "Chunk duration estimated from words");
                estimate_narration(words)
            });

        let path = workspace
            .write_chunk(chunk.index, audio.format, &audio.audio)
            .await?;

        debug!(
            chunk = chunk.index,
            attempts,
            bytes = audio.audio.len(),
            "Chunk synthesized"
        );

        Ok(SpooledChunk {
            index: chunk.index,
            path,
            format: audio.format,
            duration,
        })
    }

    /// Stitch spooled chunks, which must already be in index order
    async fn merge(
        spooled: &[SpooledChunk],
        workspace: &StoryWorkspace,
    ) -> Result<(Vec<u8>, AudioFormat, Duration), ApplicationError> {
        let format = spooled
            .first()
            .map(|chunk| chunk.format)
            .ok_or_else(|| ApplicationError::synthesis(None, "no chunk audio to merge"))?;

        let mut stitcher = AudioStitcher::new(format)
            .map_err(|e| ApplicationError::synthesis(None, e.to_string()))?;
        let mut duration = Duration::ZERO;

        for chunk in spooled {
            let bytes = workspace.read(&chunk.path).await?;
            stitcher
                .push(chunk.format, &bytes)
                .map_err(|e| ApplicationError::synthesis(Some(chunk.index), e.to_string()))?;
            duration += chunk.duration;
        }

        let audio = stitcher
            .finish()
            .map_err(|e| ApplicationError::synthesis(None, e.to_string()))?;
        Ok((audio, format, duration))
    }
}

#[allow(clippy::cast_possible_truncation)]
async fn synthesize_within(
    speech: &dyn SpeechSynthesisPort,
    text: String,
    voice: SynthesisVoice,
    timeout: Duration,
) -> Result<crate::ports::SynthesizedAudio, ProviderError> {
    tokio::time::timeout(timeout, speech.synthesize(text, voice))
        .await
        .unwrap_or_else(|_| Err(ProviderError::Timeout(timeout.as_millis() as u64)))
}
