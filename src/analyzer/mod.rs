//! Structural scan of input; yields a [`ContentAnalysis`] (spec §4.1).

pub mod elements;

use crate::analysis::{ContentAnalysis, ContentType, Preamble};
use crate::config::ChunkConfig;
use crate::error::Result;
use crate::fence::scan_fences;
use elements::{detect_headers, detect_lists, detect_tables};
use std::collections::HashSet;

/// Produce a [`ContentAnalysis`] for `text`. `text` is assumed already
/// normalized to `\n` line endings by the caller (spec §4.1's public
/// contract); this function does not re-normalize so that streaming windows
/// can reuse an already-normalized carry-over buffer without copying.
pub fn analyze(text: &str, config: &ChunkConfig) -> Result<ContentAnalysis> {
    let lines: Vec<&str> = text.lines().collect();
    let total_chars = text.chars().count();
    let total_lines = lines.len();

    let code_blocks = scan_fences(&lines);
    let fenced_lines: HashSet<u32> = code_blocks
        .iter()
        .flat_map(|b| b.start_line..=b.end_line)
        .collect();

    let headers = detect_headers(&lines, &fenced_lines);
    let tables = detect_tables(&lines, &fenced_lines);
    let lists = detect_lists(&lines, &fenced_lines);

    let outer_blocks: Vec<_> = code_blocks.iter().filter(|b| b.nesting_level == 0).collect();
    let code_chars: usize = outer_blocks
        .iter()
        .map(|b| span_char_len(&lines, b.start_line, b.end_line))
        .sum();
    let list_chars: usize = lists.iter().map(|l| l.char_len()).sum();
    let table_chars: usize = tables.iter().map(|t| t.size()).sum();
    let text_chars = total_chars
        .saturating_sub(code_chars)
        .saturating_sub(list_chars)
        .saturating_sub(table_chars);

    let (code_ratio, list_ratio, table_ratio, text_ratio) = if total_chars == 0 {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        (
            code_chars as f64 / total_chars as f64,
            list_chars as f64 / total_chars as f64,
            table_chars as f64 / total_chars as f64,
            text_chars as f64 / total_chars as f64,
        )
    };

    let max_header_depth = headers.iter().map(|h| h.level).max().unwrap_or(0);
    let max_list_nesting = lists.iter().map(|l| l.max_nesting).max().unwrap_or(0);

    let has_mixed_content = mixed_content_flag(code_ratio, list_ratio, table_ratio, text_ratio);
    let complexity_score = complexity_score(
        max_header_depth,
        max_list_nesting,
        table_ratio,
        code_ratio,
        has_mixed_content,
        total_chars,
    );
    let content_type = classify_content_type(code_ratio, list_ratio, has_mixed_content);

    let preamble = if config.extract_preamble {
        extract_preamble(&lines, &headers)
    } else {
        None
    };

    let outer_block_structs: Vec<_> = code_blocks
        .iter()
        .filter(|b| b.nesting_level == 0)
        .cloned()
        .collect();

    Ok(ContentAnalysis {
        total_chars,
        total_lines,
        code_blocks: outer_block_structs,
        code_block_count: outer_blocks.len(),
        header_count: headers.len(),
        list_count: lists.len(),
        table_count: tables.len(),
        headers,
        tables,
        lists,
        code_ratio,
        list_ratio,
        table_ratio,
        text_ratio,
        max_header_depth,
        max_list_nesting,
        has_mixed_content,
        complexity_score,
        content_type,
        preamble,
    })
}

fn span_char_len(lines: &[&str], start_line: u32, end_line: u32) -> usize {
    let start = (start_line as usize).saturating_sub(1);
    let end = (end_line as usize).min(lines.len());
    if start >= end {
        return 0;
    }
    // +1 per line for the newline joining them, matching how these chars
    // are accounted for in `total_chars`.
    lines[start..end].iter().map(|l| l.chars().count() + 1).sum::<usize>() - 1
}

fn mixed_content_flag(code_ratio: f64, list_ratio: f64, table_ratio: f64, text_ratio: f64) -> bool {
    let significant = [code_ratio > 0.1, list_ratio > 0.1, table_ratio > 0.1, text_ratio > 0.2]
        .iter()
        .filter(|b| **b)
        .count();
    significant >= 2 && code_ratio < 0.7
}

fn complexity_score(
    max_header_depth: u8,
    max_list_nesting: u32,
    table_ratio: f64,
    code_ratio: f64,
    has_mixed_content: bool,
    total_chars: usize,
) -> f64 {
    let structural = (max_header_depth as f64 / 10.0).min(0.1)
        + (max_list_nesting as f64 / 10.0).min(0.1)
        + if table_ratio > 0.0 { 0.1 } else { 0.0 };

    let content = code_ratio * 0.2 + if has_mixed_content { 0.2 } else { 0.0 };

    let size = if total_chars > 50_000 {
        0.3
    } else if total_chars > 20_000 {
        0.2
    } else if total_chars > 10_000 {
        0.1
    } else {
        0.0
    };

    (structural + content + size).clamp(0.0, 1.0)
}

fn classify_content_type(code_ratio: f64, list_ratio: f64, has_mixed_content: bool) -> ContentType {
    if code_ratio >= 0.7 {
        ContentType::CodeHeavy
    } else if list_ratio >= 0.6 && code_ratio < 0.3 {
        ContentType::ListHeavy
    } else if has_mixed_content {
        ContentType::Mixed
    } else {
        ContentType::Primary
    }
}

fn extract_preamble(lines: &[&str], headers: &[crate::analysis::Header]) -> Option<Preamble> {
    let end_line = headers.first().map(|h| h.line - 1).unwrap_or(lines.len() as u32);
    if end_line == 0 {
        return None;
    }
    let content = lines[..end_line as usize].join("\n");
    if content.trim().chars().count() < 10 {
        return None;
    }
    let looks_like_metadata = content.trim_start().starts_with("---");
    Some(Preamble {
        content,
        start_line: 1,
        end_line,
        looks_like_metadata,
    })
}
