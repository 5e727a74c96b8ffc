//! Shared paragraph/sentence packing helpers used by the code-aware,
//! structural, and sentences strategies (spec §4.2).

use crate::config::ChunkConfig;
use crate::metadata::{Chunk, ChunkContentType, ChunkMetadata};
use crate::segmentation::sentence::{last_whitespace_within, split_by_graphemes, split_sentences};

/// A contiguous run of non-blank lines, with its absolute line range.
pub struct Paragraph {
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
}

/// Split `lines` (already absolute-positioned starting at `base_line`) into
/// blank-line-separated paragraphs.
pub fn split_into_paragraphs(lines: &[&str], base_line: u32) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        let start = i;
        while i < lines.len() && !lines[i].trim().is_empty() {
            i += 1;
        }
        paragraphs.push(Paragraph {
            start_line: base_line + start as u32,
            end_line: base_line + (i as u32) - 1,
            content: lines[start..i].join("\n"),
        });
    }
    paragraphs
}

/// Break a single oversize piece of text into sentence-packed fragments
/// each respecting `max_chars`, falling back to a whitespace or grapheme
/// split when a single sentence itself exceeds the limit.
pub fn split_oversize_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let sentences = split_sentences(text);
    let sentences: Vec<&str> = if sentences.is_empty() { vec![text] } else { sentences };

    let mut fragments = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        let sentence_len = sentence.chars().count();
        if sentence_len > max_chars {
            if !current.trim().is_empty() {
                fragments.push(std::mem::take(&mut current));
            }
            let mut remaining = sentence;
            while remaining.chars().count() > max_chars {
                let split_at = last_whitespace_within(remaining, max_chars);
                match split_at {
                    Some(pos) if pos > 0 => {
                        fragments.push(remaining[..pos].to_string());
                        remaining = remaining[pos..].trim_start();
                    }
                    _ => {
                        let parts = split_by_graphemes(remaining, max_chars);
                        for p in &parts[..parts.len() - 1] {
                            fragments.push(p.to_string());
                        }
                        remaining = parts.last().copied().unwrap_or("");
                    }
                }
            }
            if !remaining.trim().is_empty() {
                current = remaining.to_string();
            }
            continue;
        }

        if current.chars().count() + sentence_len > max_chars && !current.trim().is_empty() {
            fragments.push(std::mem::take(&mut current));
        }
        current.push_str(sentence);
    }

    if !current.trim().is_empty() {
        fragments.push(current);
    }

    fragments
}

/// Greedily pack paragraphs into chunks targeting `config.target_chunk_size`,
/// never exceeding `config.max_chunk_size` unless a single paragraph is
/// itself oversize (handled per `config.allow_oversize`).
pub fn pack_paragraphs(
    paragraphs: &[Paragraph],
    config: &ChunkConfig,
    strategy: &'static str,
    content_type: ChunkContentType,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut cur_start_line = 0u32;
    let mut cur_end_line = 0u32;
    let mut cur_content = String::new();

    let flush = |content: &mut String, start: u32, end: u32, out: &mut Vec<Chunk>| {
        if content.trim().is_empty() {
            return;
        }
        out.push(Chunk::new(
            std::mem::take(content),
            start,
            end,
            ChunkMetadata::new(strategy, content_type),
        ));
    };

    for p in paragraphs {
        let added_len = if cur_content.is_empty() {
            p.content.chars().count()
        } else {
            cur_content.chars().count() + 2 + p.content.chars().count()
        };

        if p.content.chars().count() > config.max_chunk_size {
            flush(&mut cur_content, cur_start_line, cur_end_line, &mut chunks);
            if config.allow_oversize {
                let mut meta = ChunkMetadata::new(strategy, content_type);
                meta.allow_oversize = true;
                chunks.push(Chunk::new(p.content.clone(), p.start_line, p.end_line, meta));
            } else {
                for fragment in split_oversize_text(&p.content, config.max_chunk_size) {
                    chunks.push(Chunk::new(
                        fragment,
                        p.start_line,
                        p.end_line,
                        ChunkMetadata::new(strategy, content_type),
                    ));
                }
            }
            cur_start_line = 0;
            cur_end_line = 0;
            continue;
        }

        if !cur_content.is_empty() && added_len > config.max_chunk_size {
            flush(&mut cur_content, cur_start_line, cur_end_line, &mut chunks);
            cur_start_line = p.start_line;
            cur_end_line = p.end_line;
            cur_content = p.content.clone();
            continue;
        }

        if cur_content.is_empty() {
            cur_start_line = p.start_line;
        } else {
            cur_content.push_str("\n\n");
        }
        cur_content.push_str(&p.content);
        cur_end_line = p.end_line;

        if cur_content.chars().count() >= config.target_chunk_size {
            flush(&mut cur_content, cur_start_line, cur_end_line, &mut chunks);
        }
    }

    flush(&mut cur_content, cur_start_line, cur_end_line, &mut chunks);
    chunks
}
