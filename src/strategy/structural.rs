//! Structural (header-partitioned) strategy (spec §4.2.2, priority 2).

use super::packing::{pack_paragraphs, split_into_paragraphs};
use super::Strategy;
use crate::analysis::{ContentAnalysis, Header};
use crate::config::ChunkConfig;
use crate::error::Result;
use crate::metadata::{Chunk, ChunkContentType, ChunkMetadata};

pub struct StructuralStrategy;

impl Strategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn can_handle(&self, analysis: &ContentAnalysis, config: &ChunkConfig) -> bool {
        analysis.header_count >= config.header_count_threshold && analysis.max_header_depth > 1
    }

    fn apply(&self, text: &str, analysis: &ContentAnalysis, config: &ChunkConfig) -> Result<Vec<Chunk>> {
        let lines: Vec<&str> = text.lines().collect();
        let total_lines = lines.len() as u32;
        let mut chunks = Vec::new();

        if config.extract_preamble {
            if let Some(preamble) = &analysis.preamble {
                if !preamble.content.trim().is_empty() {
                    chunks.push(Chunk::new(
                        preamble.content.clone(),
                        preamble.start_line,
                        preamble.end_line,
                        ChunkMetadata::new("structural", ChunkContentType::Preamble),
                    ));
                }
            }
        }

        if analysis.headers.is_empty() {
            let paragraphs = split_into_paragraphs(&lines, 1);
            chunks.extend(pack_paragraphs(&paragraphs, config, "structural", ChunkContentType::Text));
            return Ok(chunks);
        }

        let min_level = analysis.headers.iter().map(|h| h.level).min().unwrap();
        let top_siblings: Vec<&Header> = analysis.headers.iter().filter(|h| h.level == min_level).collect();

        process_siblings(
            &top_siblings,
            &analysis.headers,
            total_lines,
            Vec::new(),
            &lines,
            config,
            &mut chunks,
        );

        Ok(chunks)
    }

    fn quality_score(&self, analysis: &ContentAnalysis) -> f64 {
        (0.3 + 0.1 * (analysis.header_count.min(10) as f64) / 10.0
            + 0.2 * (analysis.max_header_depth.min(4) as f64) / 4.0
            + 0.4 * (1.0 - analysis.code_ratio))
            .min(1.0)
    }
}

fn process_siblings(
    siblings: &[&Header],
    all_headers: &[Header],
    doc_end: u32,
    parent_path: Vec<String>,
    lines: &[&str],
    config: &ChunkConfig,
    chunks: &mut Vec<Chunk>,
) {
    for (i, header) in siblings.iter().enumerate() {
        let section_end = siblings.get(i + 1).map(|h| h.line - 1).unwrap_or(doc_end);
        let mut header_path = parent_path.clone();
        header_path.push(header.text.clone());
        process_section(header, section_end, all_headers, header_path, lines, config, chunks);
    }
}

fn process_section(
    header: &Header,
    section_end: u32,
    all_headers: &[Header],
    header_path: Vec<String>,
    lines: &[&str],
    config: &ChunkConfig,
    chunks: &mut Vec<Chunk>,
) {
    let section_size = span_char_len(lines, header.line, section_end);

    if section_size <= config.max_chunk_size {
        emit_whole_section(header, section_end, &header_path, lines, chunks);
        return;
    }

    let children: Vec<&Header> = all_headers
        .iter()
        .filter(|h| h.line > header.line && h.line <= section_end && h.level > header.level)
        .collect();

    if children.is_empty() {
        paragraph_fallback(header.line, section_end, &header_path, &header.section_id, lines, config, chunks);
        return;
    }

    let min_child_level = children.iter().map(|h| h.level).min().unwrap();
    let direct_children: Vec<&Header> = children
        .iter()
        .filter(|h| h.level == min_child_level)
        .copied()
        .collect();

    let lead_start = header.line;
    let lead_end = direct_children[0].line - 1;
    if lead_end >= lead_start {
        let lead_size = span_char_len(lines, lead_start, lead_end);
        if lead_size > 0 {
            if lead_size <= config.max_chunk_size {
                let content = span_text(lines, lead_start, lead_end);
                if !content.trim().is_empty() {
                    let mut meta = ChunkMetadata::new("structural", ChunkContentType::Text);
                    meta.header_path = Some(header_path.clone());
                    meta.section_id = Some(header.section_id.clone());
                    chunks.push(Chunk::new(content, lead_start, lead_end, meta));
                }
            } else {
                paragraph_fallback(lead_start, lead_end, &header_path, &header.section_id, lines, config, chunks);
            }
        }
    }

    process_siblings(&direct_children, all_headers, section_end, header_path, lines, config, chunks);
}

fn emit_whole_section(header: &Header, section_end: u32, header_path: &[String], lines: &[&str], chunks: &mut Vec<Chunk>) {
    let content = span_text(lines, header.line, section_end);
    if content.trim().is_empty() {
        return;
    }
    let mut meta = ChunkMetadata::new("structural", ChunkContentType::Text);
    meta.header_path = Some(header_path.to_vec());
    meta.section_id = Some(header.section_id.clone());
    chunks.push(Chunk::new(content, header.line, section_end, meta));
}

fn paragraph_fallback(
    start_line: u32,
    end_line: u32,
    header_path: &[String],
    section_id: &str,
    lines: &[&str],
    config: &ChunkConfig,
    chunks: &mut Vec<Chunk>,
) {
    if end_line < start_line {
        return;
    }
    let slice = &lines[(start_line as usize - 1)..(end_line as usize).min(lines.len())];
    let paragraphs = split_into_paragraphs(slice, start_line);
    for mut chunk in pack_paragraphs(&paragraphs, config, "structural", ChunkContentType::Text) {
        chunk.metadata.header_path = Some(header_path.to_vec());
        chunk.metadata.section_id = Some(section_id.to_string());
        chunks.push(chunk);
    }
}

fn span_text(lines: &[&str], start_line: u32, end_line: u32) -> String {
    let start = (start_line as usize).saturating_sub(1);
    let end = (end_line as usize).min(lines.len());
    if start >= end {
        return String::new();
    }
    lines[start..end].join("\n")
}

fn span_char_len(lines: &[&str], start_line: u32, end_line: u32) -> usize {
    span_text(lines, start_line, end_line).chars().count()
}
