//! Overlap manager: adds sentence-aligned context from the previous chunk
//! to each chunk, preserving fence balance (spec §4.4).

use crate::config::ChunkConfig;
use crate::metadata::Chunk;
use crate::segmentation::sentence::split_sentences;

/// Apply overlap to a sequence of chunks in place of the teacher's naive
/// token-budget suffix copy: target size is capped by `config.overlap_size`,
/// a fraction of the *source* chunk, and a fraction of the *destination*
/// chunk, and the candidate is dropped if it would split a fence.
pub struct OverlapManager;

impl OverlapManager {
    pub fn new() -> Self {
        Self
    }

    /// `apply_overlap(chunks, config) -> chunks` (spec §4.4). Idempotent when
    /// re-run on its own output with `config.enable_overlap = false`.
    pub fn apply(&self, chunks: Vec<Chunk>, config: &ChunkConfig) -> Vec<Chunk> {
        if !config.enable_overlap || chunks.len() <= 1 {
            return chunks;
        }

        let mut out = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            if i == 0 {
                out.push(chunk);
                continue;
            }
            let prev: &Chunk = &out[i - 1];
            out.push(apply_one(prev, chunk, i - 1, config));
        }
        out
    }
}

impl Default for OverlapManager {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_one(prev: &Chunk, mut chunk: Chunk, prev_index: usize, config: &ChunkConfig) -> Chunk {
    if prev.metadata.atomic || chunk.metadata.atomic {
        return chunk;
    }

    let prev_size = prev.size();
    let cur_size = chunk.size();
    if prev_size == 0 || cur_size == 0 {
        return chunk;
    }

    let target_size = [
        config.overlap_size as f64,
        prev_size as f64 * config.overlap_percentage,
        prev_size as f64 / 4.0,
    ]
    .into_iter()
    .fold(f64::INFINITY, f64::min);

    let max_size = target_size
        .min(0.5 * prev_size as f64)
        .min(0.4 * cur_size as f64);

    if max_size < 1.0 {
        return chunk;
    }
    let max_chars = max_size.floor() as usize;

    let Some(candidate) = sentence_suffix(&prev.content, max_chars) else {
        return chunk;
    };

    if has_unbalanced_fence(&candidate) {
        return chunk;
    }

    let overlap_chars = candidate.chars().count();
    chunk.content = format!("{candidate}\n\n{}", chunk.content);
    chunk.metadata.has_overlap = true;
    chunk.metadata.overlap_size_chars = Some(overlap_chars as u32);
    chunk.metadata.overlap_source_chunk_index = Some(prev_index);
    chunk
}

/// Collect whole trailing sentences from `text` whose combined length fits
/// within `max_chars`, preserving sentence boundaries (spec §4.4 step 2).
fn sentence_suffix(text: &str, max_chars: usize) -> Option<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return None;
    }

    let mut collected: Vec<&str> = Vec::new();
    let mut total = 0usize;
    for sentence in sentences.iter().rev() {
        let len = sentence.trim().chars().count();
        if len == 0 {
            continue;
        }
        if total + len > max_chars {
            break;
        }
        collected.push(sentence.trim());
        total += len;
    }

    if collected.is_empty() {
        return None;
    }
    collected.reverse();
    Some(collected.join(" "))
}

/// An odd count of triple-backtick fence markers means the candidate text
/// would open or close a fence without its matching partner.
fn has_unbalanced_fence(text: &str) -> bool {
    text.matches("```").count() % 2 != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Chunk, ChunkContentType, ChunkMetadata};

    fn chunk(content: &str, start: u32, end: u32) -> Chunk {
        Chunk::new(content, start, end, ChunkMetadata::new("sentences", ChunkContentType::Text))
    }

    #[test]
    fn single_chunk_is_unchanged() {
        let chunks = vec![chunk("Only chunk.", 1, 1)];
        let out = OverlapManager::new().apply(chunks, &ChunkConfig::balanced());
        assert_eq!(out.len(), 1);
        assert!(!out[0].metadata.has_overlap);
    }

    #[test]
    fn second_chunk_gets_sentence_aligned_prefix() {
        let filler = "Filler sentence to add length. ".repeat(8);
        let a = chunk(&format!("{filler}Sentence C."), 1, 1);
        let b = chunk(&format!("Sentence D. Sentence E. {filler}"), 2, 2);
        let config = ChunkConfig::balanced();
        let out = OverlapManager::new().apply(vec![a, b], &config);

        assert!(!out[0].metadata.has_overlap);
        assert!(out[1].metadata.has_overlap);
        assert!(out[1].content.starts_with("Sentence C."));
        assert!(out[1].content.contains("Sentence D."));
        assert!(out[1].metadata.overlap_size_chars.unwrap() <= config.overlap_size as u32);
        assert_eq!(out[1].metadata.overlap_source_chunk_index, Some(0));
    }

    #[test]
    fn atomic_chunks_never_receive_overlap() {
        let mut a = chunk("```rust\ncode\n```", 1, 3);
        a.metadata.atomic = true;
        let b = chunk("Some prose after the code block.", 4, 4);
        let out = OverlapManager::new().apply(vec![a, b], &ChunkConfig::balanced());
        assert!(!out[1].metadata.has_overlap);
    }

    #[test]
    fn unbalanced_fence_candidate_is_skipped() {
        let filler = "Padding sentence for length purposes. ".repeat(4);
        let a = chunk(&format!("{filler}```rust\nfn odd() {{}}"), 1, 2);
        let b = chunk(&format!("More prose here. {filler}"), 3, 3);
        let config = ChunkConfig {
            overlap_percentage: 1.0,
            ..ChunkConfig::balanced()
        };
        let out = OverlapManager::new().apply(vec![a, b], &config);
        assert!(!out[1].metadata.has_overlap);
    }

    #[test]
    fn disabled_overlap_leaves_chunks_untouched() {
        let a = chunk("Sentence A. Sentence B.", 1, 1);
        let b = chunk("Sentence C.", 2, 2);
        let config = ChunkConfig {
            enable_overlap: false,
            ..ChunkConfig::balanced()
        };
        let out = OverlapManager::new().apply(vec![a, b], &config);
        assert!(!out[1].metadata.has_overlap);
    }
}
