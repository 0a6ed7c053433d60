//! Splits story text into provider-sized chunks
//!
//! Chunks break at paragraph and sentence boundaries. Only a sentence that is
//! longer than the limit on its own is split further: at clause punctuation,
//! then between words, then (for a single enormous word) between characters.

use domain::{TextChunk, sentence_boundaries};

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const CLAUSE_PUNCTUATION: [char; 5] = [',', ';', ':', '—', '、'];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into ordered chunks of at most `max_chars` characters
///
/// # Examples
///
/// ```
/// use application::services::split_into_chunks;
///
/// let chunks = split_into_chunks("One two. Three four. Five six.", 20);
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].text, "One two. Three four.");
/// assert_eq!(chunks[1].text, "Five six.");
/// ```
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<TextChunk> {
    let max_chars = max_chars.max(1);
    let mut packer = Packer::new(max_chars);

    for paragraph in paragraphs(text) {
        packer.start_paragraph();
        for sentence in sentences(&paragraph) {
            if char_len(&sentence) <= max_chars {
                packer.push(&sentence);
            } else {
                for piece in split_oversized(&sentence, max_chars) {
                    packer.push(&piece);
                }
            }
        }
    }

    packer
        .finish()
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk::new(index, text))
        .collect()
}

/// Paragraphs separated by blank lines, inner whitespace collapsed
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(collapse(&current.join(" ")));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(collapse(&current.join(" ")));
    }
    out
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sentences(paragraph: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for end in sentence_boundaries(paragraph) {
        push_trimmed(&mut out, &paragraph[start..end]);
        start = end;
    }
    push_trimmed(&mut out, &paragraph[start..]);
    out
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

/// Break one over-long sentence into pieces that each fit
fn split_oversized(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut start = 0;
    for (i, c) in sentence.char_indices() {
        if CLAUSE_PUNCTUATION.contains(&c) {
            let end = i + c.len_utf8();
            push_trimmed(&mut clauses, &sentence[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut clauses, &sentence[start..]);

    let mut packer = Packer::new(max_chars);
    for clause in clauses {
        if char_len(&clause) <= max_chars {
            packer.push(&clause);
            continue;
        }
        for word in clause.split_whitespace() {
            if char_len(word) <= max_chars {
                packer.push(word);
            } else {
                let chars: Vec<char> = word.chars().collect();
                for slice in chars.chunks(max_chars) {
                    packer.push(&slice.iter().collect::<String>());
                }
            }
        }
    }
    packer.finish()
}

/// Greedy packer joining pieces with spaces (or paragraph breaks)
struct Packer {
    max_chars: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
    paragraph_pending: bool,
}

impl Packer {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
            paragraph_pending: false,
        }
    }

    fn start_paragraph(&mut self) {
        self.paragraph_pending = !self.current.is_empty();
    }

    fn push(&mut self, piece: &str) {
        let piece_len = char_len(piece);
        let separator = if self.current.is_empty() {
            ""
        } else if self.paragraph_pending {
            PARAGRAPH_SEPARATOR
        } else {
            " "
        };
        let separator_len = separator.len();

        if !self.current.is_empty() && self.current_len + separator_len + piece_len > self.max_chars
        {
            self.flush();
            self.current.push_str(piece);
            self.current_len = piece_len;
        } else {
            self.current.push_str(separator);
            self.current.push_str(piece);
            self.current_len += separator_len + piece_len;
        }
        self.paragraph_pending = false;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = split_into_chunks("Emma slept. The end.", 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "Emma slept. The end.");
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_into_chunks("  \n\n ", 100).is_empty());
    }

    #[test]
    fn never_splits_inside_a_sentence_that_fits() {
        let text = "The moon was bright. Emma looked up at the stars! Were they winking? Yes.";
        let chunks = split_into_chunks(text, 30);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "The moon was bright.",
                "Emma looked up at the stars!",
                "Were they winking? Yes."
            ]
        );
    }

    #[test]
    fn keeps_paragraph_breaks_inside_a_chunk() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let chunks = split_into_chunks(text, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn paragraph_separator_counts_toward_limit() {
        let text = "Aaaa bbbb.\n\nCccc dddd.";
        let chunks = split_into_chunks(text, 21);
        assert_eq!(chunks.len(), 2);
        let chunks = split_into_chunks(text, 22);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn overlong_sentence_splits_at_clauses() {
        let text = "Emma ran, she jumped, she laughed, and then she rested.";
        let chunks = split_into_chunks(text, 25);
        for chunk in &chunks {
            assert!(chunk.char_count() <= 25, "{:?}", chunk.text);
        }
        assert_eq!(chunks[0].text, "Emma ran, she jumped,");
    }

    #[test]
    fn giant_word_is_hard_split() {
        let word = "z".repeat(25);
        let chunks = split_into_chunks(&word, 10);
        let lengths: Vec<_> = chunks.iter().map(TextChunk::char_count).collect();
        assert_eq!(lengths, vec![10, 10, 5]);
    }

    #[test]
    fn indices_are_sequential() {
        let text = "One. Two. Three. Four. Five. Six.";
        let chunks = split_into_chunks(text, 10);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn multibyte_limit_counts_characters() {
        let text = "Ésta es una frase. Ésta también.";
        let chunks = split_into_chunks(text, 18);
        assert_eq!(chunks[0].text, "Ésta es una frase.");
    }

    proptest! {
        #[test]
        fn chunks_respect_limit_and_keep_every_word(
            words in prop::collection::vec("[a-z]{1,10}[.!?]?", 1..200),
            max in 12usize..300
        ) {
            let text = words.join(" ");
            let chunks = split_into_chunks(&text, max);

            for chunk in &chunks {
                prop_assert!(chunk.char_count() <= max);
                prop_assert!(!chunk.text.trim().is_empty());
            }

            let rejoined: Vec<String> = chunks
                .iter()
                .flat_map(|c| c.text.split_whitespace().map(str::to_string))
                .collect();
            let original: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            prop_assert_eq!(rejoined, original);
        }

        #[test]
        fn fitting_sentences_end_chunks_cleanly(
            sentences in prop::collection::vec("[a-z]{1,6}( [a-z]{1,6}){0,5}\\.", 1..60),
            max in 50usize..200
        ) {
            let text = sentences.join(" ");
            for chunk in split_into_chunks(&text, max) {
                prop_assert!(chunk.text.ends_with('.'));
            }
        }
    }
}
