//! Small text utilities shared by the extractor, merger, and summarizer.

use std::sync::LazyLock;

use regex::Regex;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Collapse every run of whitespace to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text after `.`, `!` or `?` when followed by whitespace.
///
/// Segments are whitespace-collapsed; empty segments are dropped. No length
/// filtering happens here.
pub fn split_sentences(text: &str) -> Vec<String> {
    static BOUNDARY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in BOUNDARY_RE.find_iter(text) {
        // Keep the punctuation with its sentence; the whitespace is a separator.
        push_segment(&mut sentences, &text[start..m.start() + 1]);
        start = m.end();
    }
    push_segment(&mut sentences, &text[start..]);
    sentences
}

fn push_segment(out: &mut Vec<String>, raw: &str) {
    let segment = collapse_whitespace(raw);
    if !segment.is_empty() {
        out.push(segment);
    }
}

/// Truncate to at most `max_chars` characters, ending in [`ELLIPSIS`] when cut.
///
/// Counts Unicode scalar values, not bytes.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
