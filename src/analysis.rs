//! Value objects produced by the analyzer (spec §3, §4.1).

use serde::{Deserialize, Serialize};

/// Which character opened a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FenceChar {
    Backtick,
    Tilde,
}

impl FenceChar {
    pub fn as_char(self) -> char {
        match self {
            FenceChar::Backtick => '`',
            FenceChar::Tilde => '~',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '`' => Some(Self::Backtick),
            '~' => Some(Self::Tilde),
            _ => None,
        }
    }
}

/// A fenced code block, possibly nesting others inside it.
///
/// Only outer (`nesting_level == 0`) blocks are published on
/// [`ContentAnalysis::code_blocks`]; inner ones are reachable only through
/// this outer block's own nesting, mirroring spec §4.1 step 1's "only outer
/// blocks are published" rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FencedBlock {
    pub start_line: u32,
    pub end_line: u32,
    pub fence_char: FenceChar,
    pub fence_length: usize,
    pub language: Option<String>,
    pub nesting_level: u32,
    pub content: String,
    pub is_closed: bool,
}

impl FencedBlock {
    /// Number of lines between the fences, exclusive of the fence lines
    /// themselves.
    pub fn content_line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line).saturating_sub(1)
    }

    pub fn size(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderStyle {
    Atx,
    Setext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub level: u8,
    pub text: String,
    pub line: u32,
    pub section_id: String,
    pub style: HeaderStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnAlignment {
    Left,
    Right,
    Center,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub start_line: u32,
    pub end_line: u32,
    pub column_count: usize,
    pub alignment: Vec<ColumnAlignment>,
    pub row_count: usize,
    pub raw: String,
}

impl TableBlock {
    pub fn size(&self) -> usize {
        self.raw.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Ordered,
    Unordered,
    Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub line: u32,
    pub nesting_level: u32,
    pub content: String,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub kind: ListKind,
    pub start_line: u32,
    pub end_line: u32,
    pub item_count: usize,
    pub max_nesting: u32,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn char_len(&self) -> usize {
        self.items.iter().map(|i| i.content.chars().count()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preamble {
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub looks_like_metadata: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    CodeHeavy,
    ListHeavy,
    Mixed,
    Primary,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::CodeHeavy => "code_heavy",
            ContentType::ListHeavy => "list_heavy",
            ContentType::Mixed => "mixed",
            ContentType::Primary => "primary",
        }
    }
}

/// Whole-document structural and statistical summary (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub total_chars: usize,
    pub total_lines: usize,
    pub code_blocks: Vec<FencedBlock>,
    pub headers: Vec<Header>,
    pub tables: Vec<TableBlock>,
    pub lists: Vec<List>,
    pub code_ratio: f64,
    pub list_ratio: f64,
    pub table_ratio: f64,
    pub text_ratio: f64,
    pub code_block_count: usize,
    pub header_count: usize,
    pub list_count: usize,
    pub table_count: usize,
    pub max_header_depth: u8,
    pub max_list_nesting: u32,
    pub has_mixed_content: bool,
    pub complexity_score: f64,
    pub content_type: ContentType,
    pub preamble: Option<Preamble>,
}

impl ContentAnalysis {
    /// Spec §3 invariant: ratios sum within 1e-6 of 1.0 when `total_chars > 0`.
    pub fn ratios_are_consistent(&self) -> bool {
        if self.total_chars == 0 {
            return self.code_ratio == 0.0
                && self.list_ratio == 0.0
                && self.table_ratio == 0.0
                && self.text_ratio == 0.0;
        }
        let sum = self.code_ratio + self.list_ratio + self.table_ratio + self.text_ratio;
        (sum - 1.0).abs() < 1e-6
    }
}
