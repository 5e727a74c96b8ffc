//! Sentence-packing fallback strategy (spec §4.2.3, priority 3).
//!
//! This is the universal safety net: `can_handle` always returns `true`, so
//! the selector never ends up without a usable strategy.

use super::packing::{pack_paragraphs, split_into_paragraphs};
use super::Strategy;
use crate::analysis::ContentAnalysis;
use crate::config::ChunkConfig;
use crate::error::{ChunkerError, Result};
use crate::metadata::{Chunk, ChunkContentType, ChunkMetadata};

pub struct SentencesStrategy;

impl Strategy for SentencesStrategy {
    fn name(&self) -> &'static str {
        "sentences"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn can_handle(&self, _analysis: &ContentAnalysis, _config: &ChunkConfig) -> bool {
        true
    }

    fn apply(&self, text: &str, _analysis: &ContentAnalysis, config: &ChunkConfig) -> Result<Vec<Chunk>> {
        if text.trim().is_empty() {
            return Err(ChunkerError::EmptyResult);
        }

        let lines: Vec<&str> = text.lines().collect();
        let paragraphs = split_into_paragraphs(&lines, 1);

        if paragraphs.is_empty() {
            return Err(ChunkerError::EmptyResult);
        }

        let chunks = pack_paragraphs(&paragraphs, config, "sentences", ChunkContentType::Text);
        if chunks.is_empty() {
            // Last resort: the whole document as one chunk, per spec §7's
            // "never raise an error for unchunkable content" guarantee.
            let total_lines = lines.len().max(1) as u32;
            return Ok(vec![Chunk::new(
                text.to_string(),
                1,
                total_lines,
                ChunkMetadata::new("sentences", ChunkContentType::Text),
            )]);
        }
        Ok(chunks)
    }

    fn quality_score(&self, _analysis: &ContentAnalysis) -> f64 {
        0.2
    }
}
