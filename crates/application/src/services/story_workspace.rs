//! Request-scoped scratch directory for chunk audio
//!
//! Every story gets its own temporary directory. It is removed when the
//! workspace is released or dropped, so an abandoned request leaves nothing
//! behind.

use std::path::{Path, PathBuf};

use domain::AudioFormat;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::ApplicationError;

/// Temporary files belonging to one story request
#[derive(Debug)]
pub struct StoryWorkspace {
    dir: TempDir,
}

impl StoryWorkspace {
    /// Create a workspace under `base`, or the system temp dir
    pub fn create(base: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("talebox-story-");
        let dir = match base {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        }
        .map_err(|e| ApplicationError::Internal(format!("cannot create story workspace: {e}")))?;

        debug!(path = %dir.path().display(), "Story workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Spool one chunk's audio to disk
    pub async fn write_chunk(
        &self,
        index: usize,
        format: AudioFormat,
        audio: &[u8],
    ) -> Result<PathBuf, ApplicationError> {
        let path = self
            .dir
            .path()
            .join(format!("chunk-{index:04}.{}", format.extension()));
        tokio::fs::write(&path, audio).await.map_err(|e| {
            ApplicationError::Internal(format!("cannot spool chunk {index}: {e}"))
        })?;
        Ok(path)
    }

    /// Read a spooled file back
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, ApplicationError> {
        tokio::fs::read(path).await.map_err(|e| {
            ApplicationError::Internal(format!("cannot read {}: {e}", path.display()))
        })
    }

    /// Delete the directory and everything in it
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "Story workspace released"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove story workspace"),
        }
    }
}
