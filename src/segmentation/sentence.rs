//! Abbreviation-aware sentence splitting (spec §4.2.3, §9).
//!
//! A full sentence tokenizer is out of scope; this is a pragmatic regex
//! with a short abbreviation blacklist. Some edge cases (initials,
//! ellipses) may produce sub-optimal splits — a known limitation, not a
//! correctness bug.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static TERMINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[.!?][\s)\]"'\x{00bb}]*"#).unwrap());

const ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "St.", "vs.", "etc.", "e.g.", "i.e.",
    "Inc.", "Ltd.", "Co.", "Fig.", "No.", "approx.", "Gen.", "Rev.", "Capt.",
];

fn ends_with_abbreviation(text_up_to_period: &str) -> bool {
    ABBREVIATIONS
        .iter()
        .any(|abbr| text_up_to_period.ends_with(abbr))
}

fn is_decimal_point(bytes: &[u8], period_pos: usize) -> bool {
    let before_is_digit = period_pos > 0 && bytes[period_pos - 1].is_ascii_digit();
    let after_is_digit = bytes
        .get(period_pos + 1)
        .is_some_and(u8::is_ascii_digit);
    before_is_digit && after_is_digit
}

/// Split `text` into sentences, returned as borrowed slices of the
/// original (spec §9: chunk content "may borrow, may own").
pub fn split_sentences(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0usize;

    for m in TERMINATOR.find_iter(text) {
        let period_pos = m.start();
        let punctuation = bytes[period_pos];

        if punctuation == b'.' {
            if is_decimal_point(bytes, period_pos) {
                continue;
            }
            if ends_with_abbreviation(&text[..period_pos + 1]) {
                continue;
            }
        }

        let end = m.end();
        if end > start {
            sentences.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Grapheme-safe last-resort split used when a single sentence (or other
/// atomic unit of text) still exceeds a hard size limit and no whitespace
/// boundary is available nearby.
pub fn split_by_graphemes(text: &str, max_chars: usize) -> Vec<&str> {
    if max_chars == 0 || text.is_empty() {
        return vec![text];
    }
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (idx, _) in text.grapheme_indices(true) {
        if count >= max_chars {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Find the byte offset of the last whitespace at or before `limit` chars
/// into `text`, for splitting an oversize sentence without breaking a word.
pub fn last_whitespace_within(text: &str, limit: usize) -> Option<usize> {
    let mut last_ws = None;
    let mut count = 0usize;
    for (idx, ch) in text.char_indices() {
        if count >= limit {
            break;
        }
        if ch.is_whitespace() {
            last_ws = Some(idx);
        }
        count += 1;
    }
    last_ws
}
