//! Generated story text and sentence boundary helpers

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bedtime narration pace used when no better duration is known
pub const NARRATION_WORDS_PER_MINUTE: u32 = 130;

const SENTENCE_TERMINATORS: [char; 7] = ['.', '!', '?', '…', '。', '！', '？'];
const FULL_WIDTH_TERMINATORS: [char; 3] = ['。', '！', '？'];
const SENTENCE_CLOSERS: [char; 9] = ['"', '\'', '”', '’', ')', ']', '»', '」', '』'];

/// Whether `c` ends a sentence
#[must_use]
pub fn is_sentence_terminator(c: char) -> bool {
    SENTENCE_TERMINATORS.contains(&c)
}

/// Byte offsets just past each sentence end in `text`
///
/// A sentence ends at a terminator plus any closing quotes or brackets.
/// Latin terminators only count when followed by whitespace or the end of
/// the text, so "3.5" and "e.g." inside a word do not split.
#[must_use]
pub fn sentence_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_sentence_terminator(c) {
            continue;
        }

        // Absorb repeated terminators ("?!", "...") and closing quotes.
        while let Some(&(_, next)) = chars.peek() {
            if is_sentence_terminator(next) || SENTENCE_CLOSERS.contains(&next) {
                chars.next();
            } else {
                break;
            }
        }

        let end = chars.peek().map_or(text.len(), |&(i, _)| i);
        let at_break = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if at_break || FULL_WIDTH_TERMINATORS.contains(&c) {
            boundaries.push(end);
        }
    }

    boundaries
}

/// Byte offset of the `n`th character, or the text length
fn char_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// Narrative text returned by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryText {
    text: String,
}

impl StoryText {
    /// Wrap generated text, trimming surrounding whitespace
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Narration time at [`NARRATION_WORDS_PER_MINUTE`]
    #[must_use]
    pub fn estimated_duration(&self) -> Duration {
        estimate_narration(self.word_count())
    }

    /// Whether the child's name appears in the text (case-insensitive)
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.text.to_lowercase().contains(&name.to_lowercase())
    }

    /// Cut the text to at most `max_chars` characters
    ///
    /// Cuts at the last sentence boundary that fits, else the last
    /// whitespace, else a hard character cut. Returns whether anything was
    /// removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use domain::StoryText;
    ///
    /// let story = StoryText::new("One. Two! Three?");
    /// let (cut, truncated) = story.truncate_at_sentence(12);
    /// assert!(truncated);
    /// assert_eq!(cut.as_str(), "One. Two!");
    /// ```
    #[must_use]
    pub fn truncate_at_sentence(&self, max_chars: usize) -> (Self, bool) {
        if self.char_count() <= max_chars {
            return (self.clone(), false);
        }

        let limit = char_offset(&self.text, max_chars);
        let cut = sentence_boundaries(&self.text)
            .into_iter()
            .take_while(|&end| end <= limit)
            .last()
            .filter(|&end| end > 0)
            .or_else(|| {
                self.text[..limit]
                    .rfind(char::is_whitespace)
                    .filter(|&i| i > 0)
            })
            .unwrap_or(limit);

        (Self::new(&self.text[..cut]), true)
    }
}

/// Narration time for `words` at [`NARRATION_WORDS_PER_MINUTE`]
#[must_use]
pub fn estimate_narration(words: usize) -> Duration {
    let words = f64::from(u32::try_from(words).unwrap_or(u32::MAX));
    let secs = words * 60.0 / f64::from(NARRATION_WORDS_PER_MINUTE);
    Duration::from_secs_f64(secs)
}
