//! Hierarchy builder: reconstructs parent/child/sibling links from chunk
//! `header_path`s and exposes a navigable tree (spec §4.5).

use crate::metadata::{Chunk, ChunkContentType, ChunkMetadata};
use serde_json::{json, Value};
use std::collections::HashMap;

const ROOT_ID: &str = "root";
const ROOT_SUMMARY_CHARS: usize = 200;

/// Builds a [`ChunkTree`] from an ordered list of chunks.
pub struct HierarchyBuilder {
    synthesize_root: bool,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self { synthesize_root: true }
    }

    pub fn without_root(mut self) -> Self {
        self.synthesize_root = false;
        self
    }

    /// Build the tree. `source_text` is only used to derive the synthetic
    /// root chunk's summary content.
    pub fn build(&self, mut chunks: Vec<Chunk>, source_text: &str) -> ChunkTree {
        assign_ids(&mut chunks);

        let mut all = Vec::with_capacity(chunks.len() + 1);
        if self.synthesize_root {
            all.push(synthetic_root(&chunks, source_text));
        }
        all.extend(chunks);

        let id_index: HashMap<String, usize> = all
            .iter()
            .enumerate()
            .map(|(i, c)| (chunk_id(c).to_string(), i))
            .collect();

        let paths: Vec<Vec<String>> = all
            .iter()
            .map(|c| c.metadata.header_path.clone().unwrap_or_default())
            .collect();

        link_parents(&mut all, &paths, self.synthesize_root);
        link_siblings(&mut all, &id_index);
        assign_levels(&mut all, &id_index);

        for chunk in &mut all {
            let is_leaf = chunk
                .metadata
                .children_ids
                .as_ref()
                .map(|c| c.is_empty())
                .unwrap_or(true);
            chunk.metadata.is_leaf = Some(is_leaf);
        }

        ChunkTree { chunks: all, id_index }
    }
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn chunk_id(c: &Chunk) -> &str {
    c.metadata.chunk_id.as_deref().unwrap_or(ROOT_ID)
}

fn assign_ids(chunks: &mut [Chunk]) {
    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.metadata.chunk_id = Some(format!("c{:06}", i + 1));
    }
}

fn synthetic_root(chunks: &[Chunk], source_text: &str) -> Chunk {
    let title = chunks
        .iter()
        .find_map(|c| c.metadata.header_path.as_ref().and_then(|p| p.first()))
        .cloned();

    let summary_source = chunks
        .iter()
        .find(|c| c.metadata.content_type == ChunkContentType::Preamble)
        .map(|c| c.content.as_str())
        .unwrap_or(source_text);

    let summary: String = summary_source.chars().take(ROOT_SUMMARY_CHARS).collect();
    let content = match title {
        Some(t) => format!("{t}\n\n{summary}"),
        None => summary,
    };
    let content = if content.trim().is_empty() {
        "(empty document)".to_string()
    } else {
        content
    };

    let mut metadata = ChunkMetadata::new("hierarchy", ChunkContentType::RootSummary);
    metadata.chunk_id = Some(ROOT_ID.to_string());
    metadata.is_root = Some(true);
    metadata.hierarchy_level = Some(0);

    Chunk::new(content, 1, 1, metadata)
}

/// For each non-root chunk, find the most recent earlier chunk whose
/// `header_path` is a proper prefix of this chunk's path; fall back to root.
fn link_parents(chunks: &mut [Chunk], paths: &[Vec<String>], has_root: bool) {
    let start = if has_root { 1 } else { 0 };
    let mut children_of: HashMap<usize, Vec<usize>> = HashMap::new();

    for i in start..chunks.len() {
        let my_path = &paths[i];
        let mut parent_idx = None;
        for j in (start..i).rev() {
            let candidate = &paths[j];
            if candidate.len() < my_path.len() && my_path.starts_with(candidate.as_slice()) {
                parent_idx = Some(j);
                break;
            }
        }
        let parent_idx = parent_idx.or(if has_root { Some(0) } else { None });
        if let Some(p) = parent_idx {
            children_of.entry(p).or_default().push(i);
        }
    }

    for (parent_idx, kids) in &children_of {
        let parent_id = chunk_id(&chunks[*parent_idx]).to_string();
        for &k in kids {
            chunks[k].metadata.parent_id = Some(parent_id.clone());
        }
    }
    for (parent_idx, kids) in children_of {
        let ids: Vec<String> = kids.iter().map(|&k| chunk_id(&chunks[k]).to_string()).collect();
        chunks[parent_idx].metadata.children_ids = Some(ids);
    }
}

fn link_siblings(chunks: &mut [Chunk], id_index: &HashMap<String, usize>) {
    let mut groups: HashMap<Option<String>, Vec<usize>> = HashMap::new();
    for (i, chunk) in chunks.iter().enumerate() {
        groups.entry(chunk.metadata.parent_id.clone()).or_default().push(i);
    }

    for (_parent, mut siblings) in groups {
        siblings.sort_by_key(|&i| chunks[i].start_line);
        for w in 0..siblings.len() {
            let prev_id = if w > 0 {
                Some(chunk_id(&chunks[siblings[w - 1]]).to_string())
            } else {
                None
            };
            let next_id = if w + 1 < siblings.len() {
                Some(chunk_id(&chunks[siblings[w + 1]]).to_string())
            } else {
                None
            };
            let idx = siblings[w];
            chunks[idx].metadata.prev_sibling_id = prev_id;
            chunks[idx].metadata.next_sibling_id = next_id;
        }
    }
    let _ = id_index;
}

fn assign_levels(chunks: &mut [Chunk], id_index: &HashMap<String, usize>) {
    let root_pos = chunks.iter().position(|c| c.metadata.is_root == Some(true));
    let Some(root_pos) = root_pos else {
        // No synthetic root: every top-level chunk (no parent) is level 0.
        for chunk in chunks.iter_mut() {
            if chunk.metadata.parent_id.is_none() {
                chunk.metadata.hierarchy_level = Some(0);
            }
        }
        loop {
            let mut changed = false;
            for i in 0..chunks.len() {
                if chunks[i].metadata.hierarchy_level.is_some() {
                    continue;
                }
                if let Some(parent_id) = chunks[i].metadata.parent_id.clone() {
                    if let Some(&p) = id_index.get(&parent_id) {
                        if let Some(level) = chunks[p].metadata.hierarchy_level {
                            chunks[i].metadata.hierarchy_level = Some(level + 1);
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
        return;
    };

    chunks[root_pos].metadata.hierarchy_level = Some(0);
    let mut frontier = vec![root_pos];
    while !frontier.is_empty() {
        let mut next_frontier = Vec::new();
        for parent_idx in frontier {
            let level = chunks[parent_idx].metadata.hierarchy_level.unwrap_or(0);
            let child_ids = chunks[parent_idx].metadata.children_ids.clone().unwrap_or_default();
            for id in child_ids {
                if let Some(&ci) = id_index.get(&id) {
                    chunks[ci].metadata.hierarchy_level = Some(level + 1);
                    next_frontier.push(ci);
                }
            }
        }
        frontier = next_frontier;
    }
}

/// Navigable chunk tree produced by [`HierarchyBuilder::build`]. Lookups are
/// by `chunk_id`, never by object reference (spec §6's serialization rule).
pub struct ChunkTree {
    chunks: Vec<Chunk>,
    id_index: HashMap<String, usize>,
}

impl ChunkTree {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    pub fn get_chunk(&self, id: &str) -> Option<&Chunk> {
        self.id_index.get(id).map(|&i| &self.chunks[i])
    }

    pub fn get_children(&self, id: &str) -> Vec<&Chunk> {
        self.get_chunk(id)
            .and_then(|c| c.metadata.children_ids.as_ref())
            .map(|ids| ids.iter().filter_map(|id| self.get_chunk(id)).collect())
            .unwrap_or_default()
    }

    pub fn get_parent(&self, id: &str) -> Option<&Chunk> {
        self.get_chunk(id)
            .and_then(|c| c.metadata.parent_id.as_deref())
            .and_then(|pid| self.get_chunk(pid))
    }

    pub fn get_ancestors(&self, id: &str) -> Vec<&Chunk> {
        let mut ancestors = Vec::new();
        let mut current = self.get_parent(id);
        while let Some(c) = current {
            let cid = chunk_id(c).to_string();
            ancestors.push(c);
            current = self.get_parent(&cid);
        }
        ancestors
    }

    pub fn get_siblings(&self, id: &str) -> Vec<&Chunk> {
        let Some(chunk) = self.get_chunk(id) else { return Vec::new() };
        let parent_id = chunk.metadata.parent_id.clone();
        self.chunks
            .iter()
            .filter(|c| c.metadata.parent_id == parent_id && chunk_id(c) != id)
            .collect()
    }

    pub fn get_by_level(&self, level: u32) -> Vec<&Chunk> {
        self.chunks
            .iter()
            .filter(|c| c.metadata.hierarchy_level == Some(level))
            .collect()
    }

    pub fn get_leaves(&self) -> Vec<&Chunk> {
        self.chunks.iter().filter(|c| c.metadata.is_leaf == Some(true)).collect()
    }

    /// Serialize the tree by id, not object reference (spec §6).
    pub fn to_tree_dict(&self) -> Value {
        let nodes: HashMap<String, Value> = self
            .chunks
            .iter()
            .map(|c| {
                let id = chunk_id(c).to_string();
                let node = json!({
                    "content": c.content,
                    "start_line": c.start_line,
                    "end_line": c.end_line,
                    "metadata": c.metadata.to_json_map(),
                });
                (id, node)
            })
            .collect();
        json!({ "nodes": nodes })
    }
}
