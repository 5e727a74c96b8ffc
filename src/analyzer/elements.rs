//! Non-code structural element detection (spec §4.1 step 2): headers,
//! tables, lists, and a lightweight inline-element counter used only for
//! density metrics.

use crate::analysis::{ColumnAlignment, Header, HeaderStyle, List, ListItem, ListKind, TableBlock};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static ATX_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})\s+(.*?)#*\s*$").unwrap());
static SETEXT_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}=+\s*$").unwrap());
static SETEXT_H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}-+\s*$").unwrap());
static TABLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ *\|?( *:?-{3,}:? *\|)+ *:?-{3,}:? *\|? *$").unwrap());
static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$").unwrap());
static TASK_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+\[([ xX])\]\s+(.*)$").unwrap());
static UNORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").unwrap());
static INLINE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());
static INLINE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static INLINE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").unwrap());

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_hyphen = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Scan non-fenced lines for ATX and setext headers. `fenced_lines` marks
/// every line number that falls inside any fence (outer or nested) so
/// headers are never detected inside code.
pub fn detect_headers(lines: &[&str], fenced_lines: &HashSet<u32>) -> Vec<Header> {
    let mut headers = Vec::new();
    let mut in_list = false;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = (idx + 1) as u32;
        if fenced_lines.contains(&line_no) {
            continue;
        }

        if is_list_item_line(line).is_some() {
            in_list = true;
        } else if line.trim().is_empty() {
            in_list = false;
        }

        if let Some(caps) = ATX_HEADER.captures(line) {
            let level = caps[1].len() as u8;
            let text = caps[2].trim().to_string();
            headers.push(Header {
                level,
                section_id: slugify(&text),
                text,
                line: line_no,
                style: HeaderStyle::Atx,
            });
            continue;
        }

        if in_list {
            continue;
        }

        if idx + 1 < lines.len() {
            let next_line_no = (idx + 2) as u32;
            if fenced_lines.contains(&next_line_no) {
                continue;
            }
            let next = lines[idx + 1];
            if line.trim().is_empty() {
                continue;
            }
            if SETEXT_H1.is_match(next) {
                let text = line.trim().to_string();
                headers.push(Header {
                    level: 1,
                    section_id: slugify(&text),
                    text,
                    line: line_no,
                    style: HeaderStyle::Setext,
                });
            } else if SETEXT_H2.is_match(next) {
                let text = line.trim().to_string();
                headers.push(Header {
                    level: 2,
                    section_id: slugify(&text),
                    text,
                    line: line_no,
                    style: HeaderStyle::Setext,
                });
            }
        }
    }

    headers
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && (trimmed.starts_with('|') || trimmed.contains('|'))
}

/// Scan non-fenced lines for contiguous pipe-table runs whose second line is
/// a valid separator row.
pub fn detect_tables(lines: &[&str], fenced_lines: &HashSet<u32>) -> Vec<TableBlock> {
    let mut tables = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        let line_no = (i + 1) as u32;
        if fenced_lines.contains(&line_no) || !is_table_row(lines[i]) {
            i += 1;
            continue;
        }
        if i + 1 >= lines.len() || !TABLE_SEPARATOR.is_match(lines[i + 1]) {
            i += 1;
            continue;
        }

        let start = i;
        let mut j = i + 2;
        while j < lines.len() && is_table_row(lines[j]) && !fenced_lines.contains(&((j + 1) as u32))
        {
            j += 1;
        }

        let alignment = parse_alignment(lines[i + 1]);
        let column_count = alignment.len();
        let row_count = j - start - 1; // excludes the separator row
        let raw: String = lines[start..j].join("\n");

        tables.push(TableBlock {
            start_line: (start + 1) as u32,
            end_line: j as u32,
            column_count,
            alignment,
            row_count,
            raw,
        });

        i = j;
    }

    tables
}

fn parse_alignment(separator_line: &str) -> Vec<ColumnAlignment> {
    separator_line
        .trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| {
            let cell = cell.trim();
            let left = cell.starts_with(':');
            let right = cell.ends_with(':');
            match (left, right) {
                (true, true) => ColumnAlignment::Center,
                (false, true) => ColumnAlignment::Right,
                (true, false) => ColumnAlignment::Left,
                (false, false) => ColumnAlignment::None,
            }
        })
        .collect()
}

struct ItemMatch {
    indent: usize,
    kind: ListKind,
    content: String,
    checked: Option<bool>,
}

fn is_list_item_line(line: &str) -> Option<ItemMatch> {
    if let Some(caps) = TASK_ITEM.captures(line) {
        let indent = caps[1].len();
        let checked = matches!(&caps[2], "x" | "X");
        return Some(ItemMatch {
            indent,
            kind: ListKind::Task,
            content: caps[3].to_string(),
            checked: Some(checked),
        });
    }
    if let Some(caps) = ORDERED_ITEM.captures(line) {
        let indent = caps[1].len();
        return Some(ItemMatch {
            indent,
            kind: ListKind::Ordered,
            content: caps[3].to_string(),
            checked: None,
        });
    }
    if let Some(caps) = UNORDERED_ITEM.captures(line) {
        let indent = caps[1].len();
        return Some(ItemMatch {
            indent,
            kind: ListKind::Unordered,
            content: caps[2].to_string(),
            checked: None,
        });
    }
    None
}

/// Scan non-fenced lines for list item runs. Returns only **top-level**
/// lists (nesting_level 0 at the group's shallowest item); deeper items are
/// retained as children within the same `List` via their own
/// `nesting_level`, matching spec §3's "nested lists are children" note —
/// modeled here as one flat `List` per contiguous run since downstream
/// consumers key off `max_nesting`, not a nested tree.
pub fn detect_lists(lines: &[&str], fenced_lines: &HashSet<u32>) -> Vec<List> {
    let mut lists = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        let line_no = (i + 1) as u32;
        if fenced_lines.contains(&line_no) {
            i += 1;
            continue;
        }
        let Some(first) = is_list_item_line(lines[i]) else {
            i += 1;
            continue;
        };

        let start = i;
        let kind = first.kind;
        let mut items = Vec::new();
        let mut max_nesting = 0u32;
        let mut blank_run = 0u32;

        while i < lines.len() {
            let cur_line_no = (i + 1) as u32;
            if fenced_lines.contains(&cur_line_no) {
                break;
            }
            if lines[i].trim().is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    break;
                }
                i += 1;
                continue;
            }
            blank_run = 0;

            match is_list_item_line(lines[i]) {
                Some(item) if item.kind == kind => {
                    let nesting_level = (item.indent / 2) as u32;
                    max_nesting = max_nesting.max(nesting_level);
                    items.push(ListItem {
                        line: cur_line_no,
                        nesting_level,
                        content: item.content,
                        checked: item.checked,
                    });
                    i += 1;
                }
                Some(_) => break,
                None => {
                    // continuation line (indented prose under an item) or
                    // end of the list
                    if lines[i].starts_with("  ") || lines[i].starts_with('\t') {
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
        }

        if items.is_empty() {
            i = start + 1;
            continue;
        }

        lists.push(List {
            kind,
            start_line: (start + 1) as u32,
            end_line: i as u32,
            item_count: items.len(),
            max_nesting,
            items,
        });
    }

    lists
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InlineCounts {
    pub urls: usize,
    pub inline_code: usize,
    pub images: usize,
    pub links: usize,
}

/// Fast per-line inline-element counts, used only for density metrics
/// (spec §4.1 step 2).
pub fn count_inline_elements(lines: &[&str]) -> InlineCounts {
    let mut counts = InlineCounts::default();
    for line in lines {
        counts.images += INLINE_IMAGE.find_iter(line).count();
        counts.links += INLINE_LINK
            .find_iter(line)
            .count()
            .saturating_sub(counts.images);
        counts.urls += INLINE_URL.find_iter(line).count();
        counts.inline_code += INLINE_CODE.find_iter(line).count();
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_fences() -> HashSet<u32> {
        HashSet::new()
    }

    #[test]
    fn detects_atx_headers() {
        let lines = vec!["# Title", "", "## Sub ##"];
        let headers = detect_headers(&lines, &no_fences());
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].level, 1);
        assert_eq!(headers[0].text, "Title");
        assert_eq!(headers[1].level, 2);
        assert_eq!(headers[1].text, "Sub");
    }

    #[test]
    fn detects_setext_headers() {
        let lines = vec!["Title", "=====", "", "Sub", "-----"];
        let headers = detect_headers(&lines, &no_fences());
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].level, 1);
        assert_eq!(headers[0].style, HeaderStyle::Setext);
        assert_eq!(headers[1].level, 2);
    }

    #[test]
    fn setext_disabled_inside_list() {
        let lines = vec!["- item", "text", "---"];
        let headers = detect_headers(&lines, &no_fences());
        assert!(headers.is_empty());
    }

    #[test]
    fn detects_simple_table() {
        let lines = vec!["| A | B |", "|---|---|", "| 1 | 2 |", "| 3 | 4 |"];
        let tables = detect_tables(&lines, &no_fences());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].column_count, 2);
        assert_eq!(tables[0].row_count, 2);
        assert_eq!(tables[0].start_line, 1);
        assert_eq!(tables[0].end_line, 4);
    }

    #[test]
    fn detects_table_alignment() {
        let lines = vec!["| A | B | C |", "|:---|---:|:---:|", "| 1 | 2 | 3 |"];
        let tables = detect_tables(&lines, &no_fences());
        assert_eq!(
            tables[0].alignment,
            vec![ColumnAlignment::Left, ColumnAlignment::Right, ColumnAlignment::Center]
        );
    }

    #[test]
    fn detects_unordered_and_ordered_lists() {
        let lines = vec!["- one", "- two", "", "1. first", "2. second"];
        let lists = detect_lists(&lines, &no_fences());
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].kind, ListKind::Unordered);
        assert_eq!(lists[0].item_count, 2);
        assert_eq!(lists[1].kind, ListKind::Ordered);
    }

    #[test]
    fn detects_task_list_checked_state() {
        let lines = vec!["- [ ] todo", "- [x] done", "- [X] also done"];
        let lists = detect_lists(&lines, &no_fences());
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].kind, ListKind::Task);
        assert_eq!(lists[0].items[0].checked, Some(false));
        assert_eq!(lists[0].items[1].checked, Some(true));
        assert_eq!(lists[0].items[2].checked, Some(true));
    }

    #[test]
    fn detects_nested_list_indentation() {
        let lines = vec!["- top", "  - nested", "    - deeper"];
        let lists = detect_lists(&lines, &no_fences());
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].max_nesting, 2);
    }

    #[test]
    fn slugify_handles_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
    }

    #[test]
    fn counts_inline_elements() {
        let lines = vec!["See `code` and [link](url) and https://example.com and ![img](x.png)"];
        let counts = count_inline_elements(&lines);
        assert_eq!(counts.inline_code, 1);
        assert_eq!(counts.images, 1);
        assert_eq!(counts.links, 1);
        assert_eq!(counts.urls, 1);
    }
}
