//! Validated configuration value objects.
//!
//! `ChunkConfig` and `StreamingConfig` are plain data; loading them from a
//! file, environment, or CLI flags is out of scope for this crate (see
//! spec §1's Non-goals) — callers construct them directly or via the
//! presets below.

use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Which strategy the selector should run unconditionally, bypassing
/// `can_handle` checks. See spec §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyOverride {
    CodeAware,
    Structural,
    Sentences,
}

/// Selector mode: `Strict` tries strategies in ascending priority and takes
/// the first that can handle the document; `Weighted` scores every strategy
/// and picks the highest score. Spec §9 defers to `Strict` as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorMode {
    Strict,
    Weighted,
}

impl Default for SelectorMode {
    fn default() -> Self {
        Self::Strict
    }
}

/// Configuration for the non-streaming chunking pipeline (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub max_chunk_size: usize,
    pub min_chunk_size: usize,
    pub target_chunk_size: usize,
    pub overlap_size: usize,
    pub overlap_percentage: f64,
    pub enable_overlap: bool,
    pub code_ratio_threshold: f64,
    pub min_code_blocks: usize,
    pub header_count_threshold: usize,
    pub preserve_atomic_blocks: bool,
    pub extract_preamble: bool,
    pub allow_oversize: bool,
    pub strategy_override: Option<StrategyOverride>,
    pub enable_content_validation: bool,
    pub selector_mode: SelectorMode,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 4096,
            min_chunk_size: 512,
            target_chunk_size: 2048,
            overlap_size: 200,
            overlap_percentage: 0.1,
            enable_overlap: true,
            code_ratio_threshold: 0.3,
            min_code_blocks: 1,
            header_count_threshold: 3,
            preserve_atomic_blocks: true,
            extract_preamble: true,
            allow_oversize: true,
            strategy_override: None,
            enable_content_validation: true,
            selector_mode: SelectorMode::Strict,
        }
    }
}

impl ChunkConfig {
    /// Build a config from the documented defaults, then validate.
    pub fn new() -> Result<Self> {
        Self::default().validated()
    }

    /// The documented defaults (spec §3 table), validated.
    pub fn balanced() -> Self {
        Self::default().validated().expect("defaults are always valid")
    }

    /// Tuned for embedding-sized chunks destined for a dense vector index:
    /// smaller target size, proportionally tighter overlap.
    pub fn dense_retrieval() -> Self {
        Self {
            max_chunk_size: 1536,
            min_chunk_size: 256,
            target_chunk_size: 768,
            overlap_size: 80,
            ..Self::default()
        }
        .validated()
        .expect("dense_retrieval preset is always valid")
    }

    /// Tuned for large-context LLM prompts: bigger chunks, lighter overlap
    /// since the consumer can hold more surrounding context anyway.
    pub fn large_context() -> Self {
        Self {
            max_chunk_size: 16384,
            min_chunk_size: 2048,
            target_chunk_size: 8192,
            overlap_size: 400,
            ..Self::default()
        }
        .validated()
        .expect("large_context preset is always valid")
    }

    /// Apply spec §3's validation/normalization rules and return `self` or
    /// a `ConfigInvalid` error.
    ///
    /// - all sizes must be positive
    /// - if `min_chunk_size >= max_chunk_size`, auto-correct
    ///   `min_chunk_size = max(1, max_chunk_size / 2)`
    /// - clamp `target_chunk_size` into `[min, max]`
    /// - percentages must lie in `[0, 1]`
    /// - post-condition: `min <= target <= max`
    pub fn validated(mut self) -> Result<Self> {
        if self.max_chunk_size == 0 || self.min_chunk_size == 0 || self.target_chunk_size == 0 {
            return Err(ChunkerError::config_invalid(
                "max_chunk_size, min_chunk_size, and target_chunk_size must all be positive",
            ));
        }

        if self.min_chunk_size >= self.max_chunk_size {
            self.min_chunk_size = (self.max_chunk_size / 2).max(1);
        }

        self.target_chunk_size = self
            .target_chunk_size
            .clamp(self.min_chunk_size, self.max_chunk_size);

        if !(0.0..=1.0).contains(&self.overlap_percentage) {
            return Err(ChunkerError::config_invalid(format!(
                "overlap_percentage must be in [0, 1], got {}",
                self.overlap_percentage
            )));
        }
        if !(0.0..=1.0).contains(&self.code_ratio_threshold) {
            return Err(ChunkerError::config_invalid(format!(
                "code_ratio_threshold must be in [0, 1], got {}",
                self.code_ratio_threshold
            )));
        }

        debug_assert!(self.min_chunk_size <= self.target_chunk_size);
        debug_assert!(self.target_chunk_size <= self.max_chunk_size);

        Ok(self)
    }
}

/// Configuration for the streaming chunker (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    pub buffer_size: usize,
    pub overlap_lines: usize,
    pub max_memory_bytes: usize,
    pub safe_split_threshold: f64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            overlap_lines: 8,
            max_memory_bytes: 16 * 1024 * 1024,
            safe_split_threshold: 0.8,
        }
    }
}

impl StreamingConfig {
    pub fn new() -> Result<Self> {
        Self::default().validated()
    }

    pub fn validated(self) -> Result<Self> {
        if self.buffer_size == 0 {
            return Err(ChunkerError::config_invalid("buffer_size must be positive"));
        }
        if self.max_memory_bytes == 0 {
            return Err(ChunkerError::config_invalid(
                "max_memory_bytes must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.safe_split_threshold) || self.safe_split_threshold == 0.0 {
            return Err(ChunkerError::config_invalid(format!(
                "safe_split_threshold must be in (0, 1], got {}",
                self.safe_split_threshold
            )));
        }
        Ok(self)
    }
}
