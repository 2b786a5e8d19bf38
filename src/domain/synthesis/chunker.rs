use once_cell::sync::Lazy;
use regex::Regex;

/// Spoken in place of the chunks dropped when a document needs more chunks than allowed
pub const CHUNK_LIMIT_NOTICE: &str =
    "The rest of this document was not read aloud because it exceeds the maximum supported length.";

/// Terminal punctuation followed by whitespace closes a sentence
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").unwrap());

/// A bounded piece of the input text, synthesized as one engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub is_truncation_notice: bool,
}

impl TextChunk {
    fn content(index: usize, text: &str) -> Self {
        Self {
            index,
            text: text.trim().to_string(),
            is_truncation_notice: false,
        }
    }

    fn notice(index: usize) -> Self {
        Self {
            index,
            text: CHUNK_LIMIT_NOTICE.to_string(),
            is_truncation_notice: true,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split text into sentences. Each sentence keeps its trailing punctuation and
/// whitespace; text after the last boundary is returned as the final sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in SENTENCE_BOUNDARY.find_iter(text) {
        sentences.push(&text[last_end..mat.end()]);
        last_end = mat.end();
    }

    if last_end < text.len() {
        sentences.push(&text[last_end..]);
    }

    sentences
}

/// Split text into ordered chunks of whole sentences.
///
/// Sentences are accumulated greedily while the chunk stays within
/// `max_chunk_chars` characters. A single sentence longer than the limit becomes
/// its own oversized chunk. When more than `max_chunks` chunks would be produced,
/// the leading chunks are kept and the last slot is taken by a truncation notice,
/// so the result never holds more than `max_chunks` chunks.
///
/// Empty or whitespace-only text yields no chunks.
pub fn split(text: &str, max_chunk_chars: usize, max_chunks: usize) -> Vec<TextChunk> {
    if text.trim().is_empty() || max_chunks == 0 {
        return Vec::new();
    }

    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        // Whitespace trailing the last sentence is trimmed from the chunk, so
        // only the trimmed candidate counts against the limit
        if !current.trim().is_empty() {
            let candidate_chars = format!("{}{}", current, sentence).trim().chars().count();
            if candidate_chars > max_chunk_chars {
                pieces.push(std::mem::take(&mut current));
            }
        }

        current.push_str(sentence);
    }

    if !current.trim().is_empty() {
        pieces.push(current);
    }

    let mut chunks: Vec<TextChunk> = pieces
        .iter()
        .filter(|piece| !piece.trim().is_empty())
        .enumerate()
        .map(|(index, piece)| TextChunk::content(index, piece))
        .collect();

    if chunks.len() > max_chunks {
        let kept = max_chunks.saturating_sub(1);
        tracing::warn!(
            chunk_count = chunks.len(),
            max_chunks,
            kept_chunks = kept,
            "Chunk limit exceeded, dropping trailing text"
        );
        chunks.truncate(kept);
        chunks.push(TextChunk::notice(kept));
    }

    chunks
}
