// src/lib.rs
//! # Markdown chunker
//!
//! A markdown-aware chunker for retrieval-augmented generation pipelines.
//! Documents are analyzed for structure (headers, code fences, tables,
//! lists), routed to the strategy best suited to that structure, stitched
//! back together with sentence-aligned overlap, and optionally organized
//! into a navigable parent/child/sibling hierarchy.
//!
//! ## Features
//!
//! - **Structure-aware strategies**: code-heavy, header-heavy, and plain
//!   prose documents each get a dedicated splitting strategy, selected
//!   automatically or pinned via [`config::StrategyOverride`].
//! - **Atomic blocks**: code fences and tables are never split across
//!   chunk boundaries.
//! - **Sentence-aligned overlap**: adjacent chunks share a bounded,
//!   fence-safe prefix for retrieval context continuity.
//! - **Hierarchy**: chunks can be organized into a navigable tree keyed by
//!   `chunk_id`, never by object reference.
//! - **Streaming**: bounded-memory chunking over a `BufRead` for inputs
//!   too large to hold in full.
//!
//! ## Quick start
//!
//! ```rust
//! use doc_chunker::Chunker;
//!
//! let markdown = "# Introduction\n\nThis is a test document.";
//! let chunker = Chunker::default();
//! let result = chunker.chunk(markdown).unwrap();
//!
//! for chunk in &result.chunks {
//!     println!("{} chars, strategy {}", chunk.size(), chunk.metadata.strategy);
//! }
//! ```
//!
//! ## Advanced usage
//!
//! ```rust
//! use doc_chunker::{Chunker, ChunkConfig};
//!
//! let config = ChunkConfig::dense_retrieval();
//! let chunker = Chunker::new(config).unwrap();
//! let result = chunker.chunk("# My Document\n\nContent here.").unwrap();
//! assert!(result.success);
//! ```

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod fence;
pub mod hierarchy;
pub mod metadata;
pub mod overlap;
pub mod result;
pub mod segmentation;
pub mod strategy;
pub mod streaming;
pub mod validator;

pub use config::{ChunkConfig, SelectorMode, StreamingConfig, StrategyOverride};
pub use error::{ChunkerError, Result};
pub use hierarchy::ChunkTree;
pub use metadata::{extract_links, Chunk, ChunkContentType, ChunkMetadata, Link, LinkType};
pub use result::{ChunkingResult, HierarchicalChunkingResult};
pub use streaming::{ChunkStream, StreamChunker};

use hierarchy::HierarchyBuilder;
use overlap::OverlapManager;
use std::io::BufRead;
use std::time::Instant;
use strategy::Selector;
use validator::CompletenessValidator;

/// Main chunker interface for markdown text.
///
/// Construct with a validated [`ChunkConfig`] via [`Chunker::new`], or use
/// [`Chunker::default`] for the documented defaults.
pub struct Chunker {
    config: ChunkConfig,
    selector: Selector,
}

impl Default for Chunker {
    /// Create a chunker using [`ChunkConfig::balanced`].
    fn default() -> Self {
        Self {
            config: ChunkConfig::balanced(),
            selector: Selector::new(),
        }
    }
}

impl Chunker {
    /// Validate `config` and build a chunker around it.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        let config = config.validated()?;
        Ok(Self {
            config,
            selector: Selector::new(),
        })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk `text`, selecting a strategy automatically and applying
    /// overlap, with completeness validation recorded as warnings.
    ///
    /// CRLF line endings are normalized to LF before chunking; lines
    /// reported in `start_line`/`end_line` refer to the normalized text.
    ///
    /// # Example
    ///
    /// ```rust
    /// use doc_chunker::Chunker;
    ///
    /// let chunker = Chunker::default();
    /// let markdown = "# Introduction\n\nThis is content.\n\n## Section\n\nMore content.";
    /// let result = chunker.chunk(markdown).unwrap();
    ///
    /// for chunk in &result.chunks {
    ///     println!("strategy={} lines={}-{}", chunk.metadata.strategy, chunk.start_line, chunk.end_line);
    /// }
    /// ```
    pub fn chunk(&self, text: &str) -> Result<ChunkingResult> {
        let started = Instant::now();
        let normalized = normalize_line_endings(text);

        let total_chars = normalized.chars().count();
        let total_lines = normalized.lines().count();

        if normalized.trim().is_empty() {
            return Ok(ChunkingResult {
                chunks: Vec::new(),
                strategy_used: "none".to_string(),
                processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                total_chars,
                total_lines,
                success: true,
                fallback_used: false,
                errors: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let mut errors = Vec::new();
        let mut fallback_used = false;

        let analysis = analyzer::analyze(&normalized, &self.config)?;
        let strategy = self.selector.select(&analysis, &self.config);

        let chunks = match strategy.apply(&normalized, &analysis, &self.config) {
            Ok(chunks) if !chunks.is_empty() => chunks,
            Ok(_) => {
                log::warn!("strategy '{}' produced zero chunks, falling back", strategy.name());
                errors.push(format!("strategy '{}' produced zero chunks", strategy.name()));
                fallback_used = true;
                fallback_chunk(&normalized)
            }
            Err(e) => {
                log::warn!("strategy '{}' failed ({e}), falling back", strategy.name());
                errors.push(e.to_string());
                fallback_used = true;
                fallback_chunk(&normalized)
            }
        };

        let strategy_used = chunks
            .first()
            .map(|c| c.metadata.strategy.clone())
            .unwrap_or_else(|| strategy.name().to_string());

        let mut chunks = OverlapManager::new().apply(chunks, &self.config);
        attach_links(&mut chunks);

        let warnings = if self.config.enable_content_validation {
            CompletenessValidator::new().validate(&normalized, &chunks)
        } else {
            Vec::new()
        };

        Ok(ChunkingResult {
            chunks,
            strategy_used,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            total_chars,
            total_lines,
            success: errors.is_empty(),
            fallback_used,
            errors,
            warnings,
        })
    }

    /// Chunk `text` and additionally build a navigable hierarchy from the
    /// resulting chunks' `header_path`s (spec §4.5).
    pub fn chunk_hierarchical(&self, text: &str) -> Result<HierarchicalChunkingResult> {
        let flat = self.chunk(text)?;
        let normalized = normalize_line_endings(text);
        let tree = HierarchyBuilder::new().build(flat.chunks, normalized.as_ref());

        Ok(HierarchicalChunkingResult {
            tree,
            strategy_used: flat.strategy_used,
            processing_time_ms: flat.processing_time_ms,
            total_chars: flat.total_chars,
            total_lines: flat.total_lines,
            success: flat.success,
            fallback_used: flat.fallback_used,
            errors: flat.errors,
            warnings: flat.warnings,
        })
    }

    /// Stream `reader` through bounded-memory windows, yielding chunks as
    /// they become available (spec §4.6).
    pub fn chunk_stream<R: BufRead>(
        &self,
        reader: R,
        streaming_config: StreamingConfig,
    ) -> Result<ChunkStream<R>> {
        let streaming_config = streaming_config.validated()?;
        Ok(StreamChunker::new(self.config.clone(), streaming_config).chunk_stream(reader))
    }
}

/// Normalize CRLF/CR line endings to LF. Windows-style endings would
/// otherwise break paragraph and fence detection downstream.
fn normalize_line_endings(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains('\r') {
        std::borrow::Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

/// Extract links from each chunk's final content, the same way the teacher
/// attached `links` at chunk-emission time.
fn attach_links(chunks: &mut [Chunk]) {
    for chunk in chunks {
        chunk.metadata.links = extract_links(&chunk.content);
    }
}

fn fallback_chunk(text: &str) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let end_line = text.lines().count().max(1) as u32;
    Vec::from([Chunk::new(
        text,
        1,
        end_line,
        ChunkMetadata::new("fallback", ChunkContentType::Text),
    )])
}
