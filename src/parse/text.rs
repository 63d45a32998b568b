//! Plain-text helpers shared by indexing and snippet building

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into trimmed, non-empty sentences (UAX #29 sentence bounds)
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
