//! Code-aware strategy (spec §4.2.1, priority 1).

use super::packing::{pack_paragraphs, split_into_paragraphs};
use super::Strategy;
use crate::analysis::ContentAnalysis;
use crate::config::ChunkConfig;
use crate::error::Result;
use crate::metadata::{Chunk, ChunkContentType, CodeRelationship, CodeRole, ChunkMetadata};

/// Adjacent code blocks within this many lines of each other are eligible
/// for role-relationship grouping. Not part of the public configuration
/// surface (spec §3 does not expose it); a fixed constant matching the
/// "configurable line gap" language in spec §4.2.1's code-context binding
/// note.
const RELATED_BLOCK_MAX_GAP: u32 = 3;
const MAX_CONTEXT_CHARS: usize = 200;

enum AtomicKind {
    Code,
    Table,
}

struct AtomicUnit {
    start_line: u32,
    end_line: u32,
    kind: AtomicKind,
    language: Option<String>,
    content: String,
}

pub struct CodeAwareStrategy;

impl Strategy for CodeAwareStrategy {
    fn name(&self) -> &'static str {
        "code_aware"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn can_handle(&self, analysis: &ContentAnalysis, config: &ChunkConfig) -> bool {
        analysis.code_block_count >= config.min_code_blocks
            || analysis.code_ratio >= config.code_ratio_threshold
            || analysis.table_count >= 1
    }

    fn apply(&self, text: &str, analysis: &ContentAnalysis, config: &ChunkConfig) -> Result<Vec<Chunk>> {
        let lines: Vec<&str> = text.lines().collect();
        let mut atomics: Vec<AtomicUnit> = Vec::new();

        for block in &analysis.code_blocks {
            atomics.push(AtomicUnit {
                start_line: block.start_line,
                end_line: block.end_line,
                kind: AtomicKind::Code,
                language: block.language.clone(),
                content: span_text(&lines, block.start_line, block.end_line),
            });
        }
        if config.preserve_atomic_blocks {
            for table in &analysis.tables {
                atomics.push(AtomicUnit {
                    start_line: table.start_line,
                    end_line: table.end_line,
                    kind: AtomicKind::Table,
                    language: None,
                    content: table.raw.clone(),
                });
            }
        }
        atomics.sort_by_key(|a| a.start_line);

        let mut chunks = Vec::new();
        let mut cursor: u32 = 1;

        for atomic in &atomics {
            if atomic.start_line > cursor {
                let pending = &lines[(cursor as usize - 1)..(atomic.start_line as usize - 1)];
                let paragraphs = split_into_paragraphs(pending, cursor);
                chunks.extend(pack_paragraphs(&paragraphs, config, "code_aware", ChunkContentType::Text));
            }

            let size = atomic.content.chars().count();
            let mut meta = ChunkMetadata::new(
                "code_aware",
                match atomic.kind {
                    AtomicKind::Code => ChunkContentType::Code,
                    AtomicKind::Table => ChunkContentType::Table,
                },
            );
            meta.atomic = true;
            meta.language = atomic.language.clone();
            meta.allow_oversize = size > config.max_chunk_size;
            if matches!(atomic.kind, AtomicKind::Code) {
                let preceding = context_window_before(&lines, atomic.start_line);
                meta.code_role = Some(assign_code_role(atomic.language.as_deref(), &preceding));
                meta.explanation_before = non_empty_context(&preceding);
                meta.explanation_after =
                    non_empty_context(&context_window_after(&lines, atomic.end_line));
            }

            chunks.push(Chunk::new(atomic.content.clone(), atomic.start_line, atomic.end_line, meta));
            cursor = atomic.end_line + 1;
        }

        if (cursor as usize) <= lines.len() {
            let pending = &lines[(cursor as usize - 1)..];
            let paragraphs = split_into_paragraphs(pending, cursor);
            chunks.extend(pack_paragraphs(&paragraphs, config, "code_aware", ChunkContentType::Text));
        }

        group_related_code_chunks(&mut chunks);

        Ok(chunks)
    }

    fn quality_score(&self, analysis: &ContentAnalysis) -> f64 {
        let language_diversity = analysis
            .code_blocks
            .iter()
            .filter_map(|b| b.language.as_deref())
            .collect::<std::collections::HashSet<_>>()
            .len() as f64
            / (analysis.code_block_count.max(1) as f64);
        (0.3 + 0.5 * analysis.code_ratio
            + 0.1 * (analysis.code_block_count.min(5) as f64) / 5.0
            + 0.1 * language_diversity)
            .min(1.0)
    }
}

fn span_text(lines: &[&str], start_line: u32, end_line: u32) -> String {
    let start = (start_line as usize).saturating_sub(1);
    let end = (end_line as usize).min(lines.len());
    lines[start..end].join("\n")
}

fn context_window_before(lines: &[&str], start_line: u32) -> String {
    let end = (start_line as usize).saturating_sub(1);
    let text = lines[..end.min(lines.len())].join("\n");
    let char_count = text.chars().count();
    if char_count <= MAX_CONTEXT_CHARS {
        text
    } else {
        text.chars().skip(char_count - MAX_CONTEXT_CHARS).collect()
    }
}

fn context_window_after(lines: &[&str], end_line: u32) -> String {
    let start = (end_line as usize).min(lines.len());
    let text = lines[start..].join("\n");
    text.chars().take(MAX_CONTEXT_CHARS).collect()
}

fn non_empty_context(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn assign_code_role(language: Option<&str>, preceding_context: &str) -> CodeRole {
    if let Some(lang) = language {
        let lang = lang.to_lowercase();
        if matches!(lang.as_str(), "output" | "console" | "stdout" | "result") {
            return CodeRole::Output;
        }
        if matches!(lang.as_str(), "error" | "traceback") {
            return CodeRole::Error;
        }
    }
    let lower = preceding_context.to_lowercase();
    if lower.contains("install") || lower.contains("setup") {
        return CodeRole::Setup;
    }
    if lower.contains("output") || lower.contains("result") {
        return CodeRole::Output;
    }
    if lower.contains("before") {
        return CodeRole::Before;
    }
    if lower.contains("after") {
        return CodeRole::After;
    }
    CodeRole::Example
}

/// Merge consecutive atomic code chunks into one when they are close
/// enough together to be considered a related group (spec §4.2.1's
/// code-context binding note). Operates in place; never touches text
/// chunks or tables.
fn group_related_code_chunks(chunks: &mut Vec<Chunk>) {
    let mut i = 0;
    while i + 1 < chunks.len() {
        let gap_eligible = {
            let a = &chunks[i];
            let b = &chunks[i + 1];
            a.metadata.atomic
                && b.metadata.atomic
                && a.metadata.content_type == ChunkContentType::Code
                && b.metadata.content_type == ChunkContentType::Code
                && b.start_line.saturating_sub(a.end_line) <= RELATED_BLOCK_MAX_GAP
        };
        if !gap_eligible {
            i += 1;
            continue;
        }

        let relationship = classify_relationship(&chunks[i], &chunks[i + 1]);
        let next = chunks.remove(i + 1);
        let cur = &mut chunks[i];
        cur.content.push_str("\n\n");
        cur.content.push_str(&next.content);
        cur.end_line = next.end_line;

        let mut roles = cur.metadata.code_roles.take().unwrap_or_else(|| {
            vec![cur.metadata.code_role.unwrap_or(CodeRole::Unknown)]
        });
        roles.push(next.metadata.code_role.unwrap_or(CodeRole::Unknown));
        cur.metadata.code_roles = Some(roles);
        cur.metadata.code_relationship = Some(relationship);
        cur.metadata.allow_oversize = cur.metadata.allow_oversize || next.metadata.allow_oversize;
        if cur.metadata.explanation_after.is_none() {
            cur.metadata.explanation_after = next.metadata.explanation_after;
        }
        // stay at `i` in case a third block also qualifies for the group
    }
}

fn classify_relationship(a: &Chunk, b: &Chunk) -> CodeRelationship {
    match (a.metadata.code_role, b.metadata.code_role) {
        (Some(CodeRole::Before), Some(CodeRole::After)) => CodeRelationship::BeforeAfter,
        (_, Some(CodeRole::Output)) => CodeRelationship::CodeOutput,
        (Some(a), Some(b)) if a == b => CodeRelationship::Sequential,
        _ => CodeRelationship::Related,
    }
}
