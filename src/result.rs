//! Result value objects returned by the public chunking entry points (spec §6).

use crate::hierarchy::ChunkTree;
use crate::metadata::Chunk;
use serde::{Deserialize, Serialize};

/// Returned by the non-streaming, non-hierarchical chunking entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<Chunk>,
    pub strategy_used: String,
    pub processing_time_ms: f64,
    pub total_chars: usize,
    pub total_lines: usize,
    pub success: bool,
    pub fallback_used: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ChunkingResult {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Returned by [`crate::Chunker::chunk_hierarchical`]. Carries the same
/// summary fields as [`ChunkingResult`] plus the navigable tree.
pub struct HierarchicalChunkingResult {
    pub tree: ChunkTree,
    pub strategy_used: String,
    pub processing_time_ms: f64,
    pub total_chars: usize,
    pub total_lines: usize,
    pub success: bool,
    pub fallback_used: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl HierarchicalChunkingResult {
    pub fn chunks(&self) -> &[Chunk] {
        self.tree.chunks()
    }
}
