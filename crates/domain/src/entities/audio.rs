//! Story audio entities: chunks and the final artifact

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChildName, Theme};

/// Format of synthesized audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 (default download format)
    #[default]
    Mp3,
    /// WAV container with PCM samples
    Wav,
    /// Opus codec
    Opus,
    /// OGG container
    Ogg,
}

impl AudioFormat {
    /// Get the MIME type for this format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Opus => "audio/opus",
            Self::Ogg => "audio/ogg",
        }
    }

    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Opus => "opus",
            Self::Ogg => "ogg",
        }
    }

    /// Whether independently encoded pieces can be joined losslessly
    #[must_use]
    pub const fn is_concatenable(&self) -> bool {
        matches!(self, Self::Mp3 | Self::Wav)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A bounded slice of story text, numbered in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
}

impl TextChunk {
    #[must_use]
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Synthesized audio for one text chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub index: usize,
    pub audio: Vec<u8>,
    pub format: AudioFormat,
    /// Duration reported by the provider, when known
    pub duration: Option<Duration>,
    /// Words narrated in this chunk, for duration estimates
    pub word_count: usize,
}

/// The finished story audio handed to the caller
#[derive(Clone, PartialEq, Eq)]
pub struct StoryArtifact {
    pub audio: Vec<u8>,
    pub format: AudioFormat,
    pub duration: Duration,
    pub chunk_count: usize,
    pub file_name: String,
}

impl StoryArtifact {
    /// Download name such as `emma-pirates-treasure.mp3`
    #[must_use]
    pub fn file_name_for(child_name: &ChildName, theme: &Theme, format: AudioFormat) -> String {
        let slug = slugify(&format!("{} {}", child_name.as_str(), theme.as_str()));
        let stem = if slug.is_empty() { "story" } else { slug.as_str() };
        format!("{stem}.{}", format.extension())
    }

    /// Duration as "X min Y sec"
    #[must_use]
    pub fn duration_label(&self) -> String {
        let secs = self.duration.as_secs();
        format!("{} min {} sec", secs / 60, secs % 60)
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.audio.len()
    }
}

impl fmt::Debug for StoryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryArtifact")
            .field("bytes", &self.audio.len())
            .field("format", &self.format)
            .field("duration", &self.duration)
            .field("chunk_count", &self.chunk_count)
            .field("file_name", &self.file_name)
            .finish()
    }
}

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').chars().take(60).collect()
}
