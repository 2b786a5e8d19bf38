use once_cell::sync::Lazy;
use regex::Regex;

/// Appended to text that was cut down to the maximum accepted length
pub const TEXT_TRUNCATED_NOTICE: &str =
    "This text was shortened because it exceeds the maximum length that can be read aloud.";

/// Share of the allowed length, counted from the end, searched for a sentence boundary
const BOUNDARY_WINDOW: f64 = 0.2;

static MULTIPLE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static LINE_ENDINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());
static PARAGRAPH_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+(?:\s|$)").unwrap());

/// Text ready to be chunked, plus whether it had to be shortened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    pub text: String,
    pub truncated: bool,
}

/// Light cleanup of extracted document text. Paragraph breaks survive, runs of
/// spaces and tabs collapse to one space.
pub fn clean_text(text: &str) -> String {
    let normalized = LINE_ENDINGS.replace_all(text, "\n");
    let without_tabs = normalized.replace('\t', " ");
    let single_spaced = MULTIPLE_SPACES.replace_all(&without_tabs, " ");
    let paragraphs = PARAGRAPH_BREAKS.replace_all(&single_spaced, "\n\n");

    paragraphs.trim().to_string()
}

/// Cut text longer than `max_chars` characters.
///
/// The cut lands on the last sentence end inside the final fifth of the allowed
/// length when there is one, otherwise exactly at `max_chars`. A notice is
/// appended to truncated text.
pub fn truncate_to_limit(text: &str, max_chars: usize) -> PreparedText {
    let cut_byte = match text.char_indices().nth(max_chars) {
        Some((byte, _)) => byte,
        None => {
            return PreparedText {
                text: text.to_string(),
                truncated: false,
            }
        }
    };

    let window_chars = (max_chars as f64 * (1.0 - BOUNDARY_WINDOW)).floor() as usize;
    let window_byte = text
        .char_indices()
        .nth(window_chars)
        .map(|(byte, _)| byte)
        .unwrap_or(0);

    // Matched against the full text so `$` only means the real end of input
    let boundary = SENTENCE_END
        .find_iter(&text[window_byte..])
        .map(|m| window_byte + m.start() + m.as_str().trim_end().len())
        .take_while(|&end| end <= cut_byte)
        .last();

    let kept = match boundary {
        Some(end) => &text[..end],
        None => &text[..cut_byte],
    };

    tracing::info!(
        original_chars = text.chars().count(),
        max_chars,
        kept_chars = kept.chars().count(),
        at_sentence_boundary = boundary.is_some(),
        "Text exceeds maximum length, truncating"
    );

    PreparedText {
        text: format!("{}\n\n{}", kept.trim_end(), TEXT_TRUNCATED_NOTICE),
        truncated: true,
    }
}
