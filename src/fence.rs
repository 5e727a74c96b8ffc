//! Fence-stack tracking shared between the analyzer and the streaming
//! chunker (spec §4.1 step 1, §4.6 step 2).

use crate::analysis::{FenceChar, FencedBlock};

struct OpenFence {
    start_line: u32,
    fence_char: FenceChar,
    fence_length: usize,
    language: Option<String>,
    content: Vec<String>,
}

/// Recognizes a fence opening/closing candidate on a single line.
struct FenceCandidate {
    fence_char: FenceChar,
    fence_length: usize,
    info_string: Option<String>,
}

fn classify_line(line: &str) -> Option<FenceCandidate> {
    let indent = line.chars().take_while(|c| *c == ' ').count();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let first = rest.chars().next()?;
    let fence_char = FenceChar::from_char(first)?;
    let run_len = rest.chars().take_while(|c| *c == first).count();
    if run_len < 3 {
        return None;
    }
    let remainder = rest[run_len..].trim();
    let info_string = if remainder.is_empty() {
        None
    } else {
        if fence_char == FenceChar::Backtick && remainder.contains('`') {
            return None;
        }
        Some(remainder.to_string())
    };
    Some(FenceCandidate {
        fence_char,
        fence_length: run_len,
        info_string,
    })
}

fn extract_language(info_string: &str) -> Option<String> {
    info_string
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Incremental fence-stack tracker. A document is fed one line at a time;
/// completed blocks (innermost first) accumulate in [`FenceTracker::blocks`].
/// Reused unmodified by the streaming chunker so a fence that crosses a
/// window boundary is visible via [`FenceTracker::is_open`].
pub struct FenceTracker {
    stack: Vec<OpenFence>,
    blocks: Vec<FencedBlock>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Feed one line (1-based `line_no`, content without the trailing `\n`).
    pub fn process_line(&mut self, line_no: u32, line: &str) {
        if let Some(top) = self.stack.last() {
            if let Some(candidate) = classify_line(line) {
                let closes = candidate.info_string.is_none()
                    && candidate.fence_char == top.fence_char
                    && candidate.fence_length >= top.fence_length;
                if closes {
                    let open = self.stack.pop().unwrap();
                    for still_open in &mut self.stack {
                        still_open.content.push(line.to_string());
                    }
                    self.blocks.push(FencedBlock {
                        start_line: open.start_line,
                        end_line: line_no,
                        fence_char: open.fence_char,
                        fence_length: open.fence_length,
                        language: open.language,
                        nesting_level: self.stack.len() as u32,
                        content: open.content.join("\n"),
                        is_closed: true,
                    });
                    return;
                }
                // Not a close: a fence of either kind may open nested inside
                // another, interleaving freely since only the innermost is
                // ever checked for a close.
                for open in &mut self.stack {
                    open.content.push(line.to_string());
                }
                self.stack.push(OpenFence {
                    start_line: line_no,
                    fence_char: candidate.fence_char,
                    fence_length: candidate.fence_length,
                    language: candidate.info_string.as_deref().and_then(extract_language),
                    content: Vec::new(),
                });
                return;
            }
            for open in &mut self.stack {
                open.content.push(line.to_string());
            }
            return;
        }

        if let Some(candidate) = classify_line(line) {
            self.stack.push(OpenFence {
                start_line: line_no,
                fence_char: candidate.fence_char,
                fence_length: candidate.fence_length,
                language: candidate.info_string.as_deref().and_then(extract_language),
                content: Vec::new(),
            });
        }
    }

    /// Close any still-open fences at EOF (or window end), marking them
    /// `is_closed = false`. `last_line` is the last line number fed.
    pub fn finish(&mut self, last_line: u32) {
        while let Some(open) = self.stack.pop() {
            let nesting_level = self.stack.len() as u32;
            self.blocks.push(FencedBlock {
                start_line: open.start_line,
                end_line: last_line,
                fence_char: open.fence_char,
                fence_length: open.fence_length,
                language: open.language,
                nesting_level,
                content: open.content.join("\n"),
                is_closed: false,
            });
        }
    }

    /// All blocks discovered so far (both outer and nested), in the order
    /// they closed. Call after [`FenceTracker::finish`] to include unclosed
    /// trailing fences.
    pub fn into_blocks(self) -> Vec<FencedBlock> {
        self.blocks
    }
}

impl Default for FenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a full document's lines and return every fenced block, nested ones
/// included, sorted by start line.
pub fn scan_fences(lines: &[&str]) -> Vec<FencedBlock> {
    let mut tracker = FenceTracker::new();
    for (i, line) in lines.iter().enumerate() {
        tracker.process_line((i + 1) as u32, line);
    }
    if !lines.is_empty() {
        tracker.finish(lines.len() as u32);
    }
    let mut blocks = tracker.into_blocks();
    blocks.sort_by_key(|b| b.start_line);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_fence_closes() {
        let lines = vec!["```python", "x = 1", "```"];
        let blocks = scan_fences(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 1);
        assert_eq!(blocks[0].end_line, 3);
        assert_eq!(blocks[0].language, Some("python".to_string()));
        assert!(blocks[0].is_closed);
        assert_eq!(blocks[0].nesting_level, 0);
    }

    #[test]
    fn nested_fences_report_outer_only_level_zero() {
        let lines = vec!["`````md", "outer text", "```", "inner", "```", "more outer", "`````"];
        let blocks = scan_fences(&lines);
        assert_eq!(blocks.len(), 2);
        let outer = blocks.iter().find(|b| b.nesting_level == 0).unwrap();
        assert_eq!(outer.start_line, 1);
        assert_eq!(outer.end_line, 7);
        let inner = blocks.iter().find(|b| b.nesting_level == 1).unwrap();
        assert_eq!(inner.start_line, 3);
        assert_eq!(inner.end_line, 5);

        // content is exclusive of both fence lines, including the inner
        // fence's own closing line.
        let outer_content_lines: Vec<&str> = outer.content.split('\n').collect();
        assert_eq!(outer_content_lines.len(), (outer.end_line - outer.start_line - 1) as usize);
        assert_eq!(outer_content_lines, vec!["outer text", "```", "inner", "```", "more outer"]);
    }

    #[test]
    fn unclosed_fence_reported_not_closed() {
        let lines = vec!["```rust", "fn main() {}"];
        let blocks = scan_fences(&lines);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].is_closed);
        assert_eq!(blocks[0].end_line, 2);
    }

    #[test]
    fn tilde_and_backtick_do_not_close_each_other() {
        let lines = vec!["~~~", "```", "code", "```", "more"];
        let blocks = scan_fences(&lines);
        // line 2 opens a nested backtick fence rather than closing the
        // outer tilde fence; line 4 closes that inner backtick fence, but
        // the outer tilde fence is never closed by a tilde line and remains
        // open through EOF.
        let inner = blocks
            .iter()
            .find(|b| b.fence_char == FenceChar::Backtick)
            .unwrap();
        assert_eq!(inner.start_line, 2);
        assert_eq!(inner.end_line, 4);
        assert!(inner.is_closed);

        let outer = blocks
            .iter()
            .find(|b| b.fence_char == FenceChar::Tilde)
            .unwrap();
        assert_eq!(outer.start_line, 1);
        assert_eq!(outer.end_line, 5);
        assert!(!outer.is_closed);
    }

    #[test]
    fn backtick_info_string_with_backtick_is_not_a_fence() {
        let lines = vec!["```rust ` oops", "code", "```"];
        let blocks = scan_fences(&lines);
        // line 1 is not a valid opener (backtick inside its own info
        // string), so the lone closer on line 3 opens instead and is left
        // unclosed at EOF.
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 3);
        assert!(!blocks[0].is_closed);
    }
}
