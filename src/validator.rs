//! Completeness validator: post-emit sanity check (spec §4.7).
//!
//! Never mutates chunks, never raises; violations become warnings appended
//! to the caller's [`crate::result::ChunkingResult`].

use crate::metadata::Chunk;

const COVERAGE_TOLERANCE: f64 = 0.05;
const LINE_GAP_WARNING_THRESHOLD: u32 = 10;
const DUPLICATION_TOLERANCE: f64 = 0.10;

pub struct CompletenessValidator;

impl CompletenessValidator {
    pub fn new() -> Self {
        Self
    }

    /// Run all checks against `input` and the chunks produced from it,
    /// returning human-readable warnings (empty if everything passed).
    pub fn validate(&self, input: &str, chunks: &[Chunk]) -> Vec<String> {
        let mut warnings = Vec::new();

        self.check_coverage(input, chunks, &mut warnings);
        self.check_line_coverage(input, chunks, &mut warnings);
        self.check_duplication(chunks, &mut warnings);

        if !warnings.is_empty() {
            log::debug!("completeness validator raised {} warning(s)", warnings.len());
        }

        warnings
    }

    fn check_coverage(&self, input: &str, chunks: &[Chunk], warnings: &mut Vec<String>) {
        let input_chars = normalized_char_count(input);
        if input_chars == 0 {
            return;
        }
        let output_chars: usize = chunks
            .iter()
            .map(|c| normalized_char_count(&content_without_overlap(c)))
            .sum();

        let diff = (output_chars as f64 - input_chars as f64).abs();
        let tolerance = COVERAGE_TOLERANCE * input_chars as f64;
        if diff > tolerance {
            warnings.push(format!(
                "coverage check: output/input char difference {diff:.0} exceeds {tolerance:.0} ({:.1}% tolerance)",
                COVERAGE_TOLERANCE * 100.0
            ));
        }
    }

    fn check_line_coverage(&self, input: &str, chunks: &[Chunk], warnings: &mut Vec<String>) {
        let total_lines = input.lines().count() as u32;
        if total_lines == 0 {
            return;
        }

        let mut covered = vec![false; total_lines as usize + 1];
        for chunk in chunks {
            let start = chunk.start_line.max(1);
            let end = chunk.end_line.min(total_lines);
            for line in start..=end {
                if (line as usize) < covered.len() {
                    covered[line as usize] = true;
                }
            }
        }

        let non_blank: Vec<u32> = input
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, _)| i as u32 + 1)
            .collect();

        let mut gap_start: Option<u32> = None;
        let mut prev_line = 0u32;
        for line in non_blank {
            let is_covered = covered.get(line as usize).copied().unwrap_or(false);
            if is_covered {
                if let Some(start) = gap_start.take() {
                    let gap_len = prev_line - start + 1;
                    if gap_len >= LINE_GAP_WARNING_THRESHOLD {
                        warnings.push(format!("line coverage gap of {gap_len} lines starting at line {start}"));
                    }
                }
            } else if gap_start.is_none() {
                gap_start = Some(line);
            }
            prev_line = line;
        }
        if let Some(start) = gap_start {
            let gap_len = prev_line - start + 1;
            if gap_len >= LINE_GAP_WARNING_THRESHOLD {
                warnings.push(format!("line coverage gap of {gap_len} lines starting at line {start}"));
            }
        }
    }

    fn check_duplication(&self, chunks: &[Chunk], warnings: &mut Vec<String>) {
        for pair in chunks.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            let declared_overlap = cur.metadata.overlap_size_chars.unwrap_or(0) as usize;
            let cur_without_overlap = content_without_overlap(cur);
            let actual_shared = shared_prefix_len(&prev.content, &cur_without_overlap);

            let tolerance = declared_overlap + (declared_overlap as f64 * DUPLICATION_TOLERANCE) as usize + 1;
            if actual_shared > tolerance {
                warnings.push(format!(
                    "duplication check: chunks at lines {}-{} and {}-{} share {actual_shared} chars, declared overlap is {declared_overlap}",
                    prev.start_line, prev.end_line, cur.start_line, cur.end_line
                ));
            }
        }
    }
}

impl Default for CompletenessValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn content_without_overlap(chunk: &Chunk) -> String {
    match chunk.metadata.overlap_size_chars {
        Some(n) if chunk.metadata.has_overlap => chunk.content.chars().skip(n as usize + 2).collect(),
        _ => chunk.content.clone(),
    }
}

fn normalized_char_count(text: &str) -> usize {
    text.split_whitespace().collect::<String>().chars().count()
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
