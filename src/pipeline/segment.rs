//! Question segmentation: split the extracted text into one block per
//! original question.
//!
//! A block starts right after a newline that is followed by an integer
//! marker (`12. `, `7) `), optionally preceded by whitespace. Text before
//! the first marker is a preamble block of its own. Every block is trimmed
//! and empty blocks are dropped, so blank separator lines never produce a
//! question.

use once_cell::sync::Lazy;
use regex::Regex;

/// Anchored at a candidate line start: optional whitespace, digits, `.` or `)`,
/// then at least one whitespace character.
static RE_QUESTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*\d+[.)]\s").expect("static regex"));

/// Split `raw_text` into trimmed, non-empty question blocks, in order.
pub fn split_questions(raw_text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut start = 0;

    for (idx, _) in raw_text.match_indices('\n') {
        let next = idx + 1;
        if RE_QUESTION_MARKER.is_match(&raw_text[next..]) {
            push_trimmed(&mut blocks, &raw_text[start..idx]);
            start = next;
        }
    }
    push_trimmed(&mut blocks, &raw_text[start..]);
    blocks
}

fn push_trimmed(blocks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
}
