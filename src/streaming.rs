//! Streaming chunker: bounded-memory chunking over an unbounded input
//! (spec §4.6).

use crate::analyzer::elements::{detect_headers, detect_lists, detect_tables};
use crate::analyzer::{self};
use crate::config::{ChunkConfig, StreamingConfig};
use crate::error::{ChunkerError, Result};
use crate::fence::scan_fences;
use crate::metadata::Chunk;
use crate::overlap::OverlapManager;
use crate::strategy::Selector;
use std::collections::{HashSet, VecDeque};
use std::io::BufRead;

/// Entry point mirroring spec §4.6's `chunk_stream(stream, chunk_config,
/// streaming_config) -> iterator[Chunk]`.
pub struct StreamChunker {
    chunk_config: ChunkConfig,
    streaming_config: StreamingConfig,
}

impl StreamChunker {
    pub fn new(chunk_config: ChunkConfig, streaming_config: StreamingConfig) -> Self {
        Self { chunk_config, streaming_config }
    }

    pub fn chunk_stream<R: BufRead>(&self, reader: R) -> ChunkStream<R> {
        ChunkStream {
            lines: reader.lines(),
            chunk_config: self.chunk_config.clone(),
            streaming_config: self.streaming_config,
            carry_over: VecDeque::new(),
            next_line_no: 1,
            pending: VecDeque::new(),
            window_index: 0,
            global_chunk_index: 0,
            bytes_processed: 0,
            done: false,
            cancelled: false,
        }
    }
}

/// Pull-driven iterator of [`Chunk`]s. Each call to `next` performs one
/// window's work: read, analyze, select a strategy, apply overlap, yield.
/// Dropping the iterator mid-stream releases the reader with no partial
/// chunk emitted (spec §5's cancellation contract).
pub struct ChunkStream<R: BufRead> {
    lines: std::io::Lines<R>,
    chunk_config: ChunkConfig,
    streaming_config: StreamingConfig,
    carry_over: VecDeque<(u32, String)>,
    next_line_no: u32,
    pending: VecDeque<Chunk>,
    window_index: usize,
    global_chunk_index: usize,
    bytes_processed: usize,
    done: bool,
    cancelled: bool,
}

impl<R: BufRead> ChunkStream<R> {
    /// Request cancellation: no further windows are read; any
    /// already-pending chunks are discarded.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.pending.clear();
    }

    fn fill_next_window(&mut self) -> Result<bool> {
        let mut window: Vec<(u32, String)> = self.carry_over.drain(..).collect();
        let mut char_count: usize = window.iter().map(|(_, l)| l.chars().count() + 1).sum();
        let mut reached_eof = false;

        loop {
            if char_count >= self.streaming_config.buffer_size {
                break;
            }
            match self.lines.next() {
                Some(Ok(line)) => {
                    let line_no = self.next_line_no;
                    self.next_line_no += 1;
                    let byte_len = line.len() + 1;
                    if byte_len > self.streaming_config.max_memory_bytes {
                        return Err(ChunkerError::MemoryLimitExceeded(
                            byte_len,
                            self.streaming_config.max_memory_bytes,
                        ));
                    }
                    self.bytes_processed += byte_len;
                    char_count += line.chars().count() + 1;
                    window.push((line_no, line));
                }
                Some(Err(_)) => return Err(ChunkerError::InvalidEncoding),
                None => {
                    reached_eof = true;
                    break;
                }
            }
        }

        if window.is_empty() {
            return Ok(false);
        }

        // Defer rule: never cut while a fence opened in this window is still
        // open. Keep reading until it closes or the stream ends.
        loop {
            let texts: Vec<&str> = window.iter().map(|(_, l)| l.as_str()).collect();
            let blocks = scan_fences(&texts);
            let trailing_open = blocks.iter().any(|b| !b.is_closed);
            if !trailing_open || reached_eof {
                break;
            }
            match self.lines.next() {
                Some(Ok(line)) => {
                    let line_no = self.next_line_no;
                    self.next_line_no += 1;
                    let byte_len = line.len() + 1;
                    if byte_len > self.streaming_config.max_memory_bytes {
                        return Err(ChunkerError::MemoryLimitExceeded(
                            byte_len,
                            self.streaming_config.max_memory_bytes,
                        ));
                    }
                    self.bytes_processed += byte_len;
                    window.push((line_no, line));
                }
                Some(Err(_)) => return Err(ChunkerError::InvalidEncoding),
                None => reached_eof = true,
            }
        }

        let (used, carry_over) = if reached_eof {
            (window, Vec::new())
        } else {
            let split_idx = find_split_point(&window, &self.streaming_config);
            let used: Vec<(u32, String)> = window[..split_idx].to_vec();
            let overlap_n = self.streaming_config.overlap_lines.min(split_idx);
            let mut carry: Vec<(u32, String)> = window[split_idx - overlap_n..split_idx].to_vec();
            carry.extend(window[split_idx..].iter().cloned());
            (used, carry)
        };

        self.carry_over = carry_over.into();

        if used.is_empty() {
            return Ok(true);
        }

        let window_text: String = used.iter().map(|(_, l)| l.as_str()).collect::<Vec<_>>().join("\n");
        let line_offset = used[0].0 - 1;

        let analysis = analyzer::analyze(&window_text, &self.chunk_config)?;
        let selector = Selector::new();
        let strategy = selector.select(&analysis, &self.chunk_config);
        let chunks = strategy.apply(&window_text, &analysis, &self.chunk_config)?;
        let mut chunks = OverlapManager::new().apply(chunks, &self.chunk_config);

        for chunk in &mut chunks {
            chunk.start_line += line_offset;
            chunk.end_line += line_offset;
            chunk.metadata.stream_window_index = Some(self.window_index);
            chunk.metadata.stream_chunk_index = Some(self.global_chunk_index);
            chunk.metadata.bytes_processed = Some(self.bytes_processed);
            self.global_chunk_index += 1;
        }

        log::debug!(
            "streaming window {} yielded {} chunk(s), {} bytes processed",
            self.window_index,
            chunks.len(),
            self.bytes_processed
        );
        self.window_index += 1;
        self.pending.extend(chunks);
        Ok(true)
    }
}

impl<R: BufRead> Iterator for ChunkStream<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(Ok(chunk));
            }
            if self.done || self.cancelled {
                return None;
            }
            match self.fill_next_window() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Find a safe split point (exclusive end index into `window`) per spec
/// §4.6 step 3's preference order: before a header, at a blank line, at a
/// newline outside any fence/list/table, or a last-resort fallback.
fn find_split_point(window: &[(u32, String)], streaming_config: &StreamingConfig) -> usize {
    let texts: Vec<&str> = window.iter().map(|(_, l)| l.as_str()).collect();
    let target_offset = (streaming_config.safe_split_threshold * streaming_config.buffer_size as f64) as usize;

    let mut cumulative = Vec::with_capacity(texts.len());
    let mut running = 0usize;
    for t in &texts {
        running += t.chars().count() + 1;
        cumulative.push(running);
    }

    let blocks = scan_fences(&texts);
    let fenced_lines: HashSet<u32> = blocks.iter().flat_map(|b| b.start_line..=b.end_line).collect();
    let headers = detect_headers(&texts, &fenced_lines);
    let tables = detect_tables(&texts, &fenced_lines);
    let lists = detect_lists(&texts, &fenced_lines);

    let header_lines: HashSet<u32> = headers.iter().map(|h| h.line).collect();
    let table_lines: HashSet<u32> = tables.iter().flat_map(|t| t.start_line..=t.end_line).collect();
    let list_lines: HashSet<u32> = lists.iter().flat_map(|l| l.start_line..=l.end_line).collect();

    let after_target = |idx: usize| cumulative[idx] >= target_offset;

    // 1. The line before a header line.
    for (idx, _) in texts.iter().enumerate() {
        let line_no = (idx + 1) as u32;
        if header_lines.contains(&line_no) && idx > 0 && after_target(idx.saturating_sub(1)) {
            return idx;
        }
    }

    // 2. A blank-line paragraph break.
    for (idx, t) in texts.iter().enumerate() {
        if t.trim().is_empty() && after_target(idx) {
            return idx + 1;
        }
    }

    // 3. A newline outside any fence, list, or table.
    for (idx, _) in texts.iter().enumerate() {
        let line_no = (idx + 1) as u32;
        if after_target(idx)
            && !fenced_lines.contains(&line_no)
            && !table_lines.contains(&line_no)
            && !list_lines.contains(&line_no)
        {
            return idx + 1;
        }
    }

    // 4. Fallback: split exactly at the threshold offset.
    for (idx, _) in texts.iter().enumerate() {
        if after_target(idx) {
            return (idx + 1).min(texts.len());
        }
    }
    texts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect_all(text: &str, chunk_config: ChunkConfig, streaming_config: StreamingConfig) -> Vec<Chunk> {
        let chunker = StreamChunker::new(chunk_config, streaming_config);
        let cursor = Cursor::new(text.as_bytes().to_vec());
        chunker
            .chunk_stream(cursor)
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn small_input_fits_in_one_window() {
        let text = "# Title\n\nSome short body text.\n";
        let chunks = collect_all(text, ChunkConfig::balanced(), StreamingConfig::default());
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].metadata.stream_window_index, Some(0));
    }

    #[test]
    fn chunks_are_in_strict_source_order() {
        let mut text = String::new();
        for i in 0..200 {
            text.push_str(&format!("Paragraph number {i} with some body text to pad it out.\n\n"));
        }
        let streaming_config = StreamingConfig {
            buffer_size: 2048,
            ..StreamingConfig::default()
        };
        let chunks = collect_all(&text, ChunkConfig::balanced(), streaming_config);
        assert!(chunks.len() > 1);
        for w in chunks.windows(2) {
            assert!(w[1].start_line >= w[0].start_line);
        }
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.metadata.stream_chunk_index, Some(i));
        }
    }

    #[test]
    fn fence_is_never_split_across_windows() {
        let mut text = String::from("Intro paragraph text to pad the first window out a little.\n\n");
        text.push_str("```rust\n");
        for i in 0..50 {
            text.push_str(&format!("let x{i} = {i};\n"));
        }
        text.push_str("```\n\nOutro paragraph.\n");

        let streaming_config = StreamingConfig {
            buffer_size: 256,
            ..StreamingConfig::default()
        };
        let chunks = collect_all(&text, ChunkConfig::balanced(), streaming_config);
        let has_split_fence = chunks.iter().any(|c| c.content.matches("```").count() % 2 != 0);
        assert!(!has_split_fence);
    }

    #[test]
    fn memory_limit_is_enforced() {
        let text = "x".repeat(1000);
        let streaming_config = StreamingConfig {
            max_memory_bytes: 10,
            ..StreamingConfig::default()
        };
        let chunker = StreamChunker::new(ChunkConfig::balanced(), streaming_config);
        let cursor = Cursor::new(text.into_bytes());
        let mut stream = chunker.chunk_stream(cursor);
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, ChunkerError::MemoryLimitExceeded(_, _)));
    }

    #[test]
    fn cancellation_stops_further_yields() {
        let mut text = String::new();
        for i in 0..100 {
            text.push_str(&format!("Line {i} of padding text.\n"));
        }
        let chunker = StreamChunker::new(ChunkConfig::balanced(), StreamingConfig {
            buffer_size: 128,
            ..StreamingConfig::default()
        });
        let cursor = Cursor::new(text.into_bytes());
        let mut stream = chunker.chunk_stream(cursor);
        assert!(stream.next().is_some());
        stream.cancel();
        assert!(stream.next().is_none());
    }
}
