//! Chunk value objects and their metadata (spec §3, §6).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `metadata.content_type`, spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkContentType {
    Code,
    Table,
    List,
    Text,
    Mixed,
    Preamble,
    RootSummary,
}

impl ChunkContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Table => "table",
            Self::List => "list",
            Self::Text => "text",
            Self::Mixed => "mixed",
            Self::Preamble => "preamble",
            Self::RootSummary => "root_summary",
        }
    }
}

/// Which code role a code block was assigned during code-context binding
/// (spec §4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeRole {
    Example,
    Setup,
    Output,
    Error,
    Before,
    After,
    Unknown,
}

impl CodeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Example => "example",
            Self::Setup => "setup",
            Self::Output => "output",
            Self::Error => "error",
            Self::Before => "before",
            Self::After => "after",
            Self::Unknown => "unknown",
        }
    }
}

/// How a group of adjacent code blocks relate to one another (spec §4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeRelationship {
    Sequential,
    BeforeAfter,
    CodeOutput,
    Related,
}

impl CodeRelationship {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::BeforeAfter => "before_after",
            Self::CodeOutput => "code_output",
            Self::Related => "related",
        }
    }
}

/// Per-chunk metadata. `strategy` and `content_type` are always populated
/// (spec §6); everything else is optional and mirrors spec §6's list of
/// recognized-but-optional keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub strategy: String,
    pub content_type: ChunkContentType,

    pub language: Option<String>,
    pub atomic: bool,
    pub allow_oversize: bool,
    pub header_path: Option<Vec<String>>,
    pub section_id: Option<String>,

    pub has_overlap: bool,
    pub overlap_size_chars: Option<u32>,
    pub overlap_source_chunk_index: Option<usize>,

    pub chunk_id: Option<String>,
    pub parent_id: Option<String>,
    pub children_ids: Option<Vec<String>>,
    pub prev_sibling_id: Option<String>,
    pub next_sibling_id: Option<String>,
    pub hierarchy_level: Option<u32>,
    pub is_root: Option<bool>,
    pub is_leaf: Option<bool>,

    pub code_role: Option<CodeRole>,
    pub code_roles: Option<Vec<CodeRole>>,
    pub code_relationship: Option<CodeRelationship>,
    pub explanation_before: Option<String>,
    pub explanation_after: Option<String>,

    pub stream_window_index: Option<usize>,
    pub stream_chunk_index: Option<usize>,
    pub bytes_processed: Option<usize>,

    /// Internal marker for the §4.2 contract: true when this chunk's
    /// `start_line` legitimately equals the previous chunk's `end_line`
    /// because they share an atomic boundary line.
    pub touches_boundary: bool,

    /// Links found in this chunk (markdown links and wiki-style links).
    /// Additive metadata, not part of spec §6's guaranteed key set.
    pub links: Vec<Link>,
}

impl ChunkMetadata {
    pub fn new(strategy: impl Into<String>, content_type: ChunkContentType) -> Self {
        Self {
            strategy: strategy.into(),
            content_type,
            language: None,
            atomic: false,
            allow_oversize: false,
            header_path: None,
            section_id: None,
            has_overlap: false,
            overlap_size_chars: None,
            overlap_source_chunk_index: None,
            chunk_id: None,
            parent_id: None,
            children_ids: None,
            prev_sibling_id: None,
            next_sibling_id: None,
            hierarchy_level: None,
            is_root: None,
            is_leaf: None,
            code_role: None,
            code_roles: None,
            code_relationship: None,
            explanation_before: None,
            explanation_after: None,
            stream_window_index: None,
            stream_chunk_index: None,
            bytes_processed: None,
            touches_boundary: false,
            links: Vec::new(),
        }
    }

    /// Render into the JSON-scalar-or-string-array map shape described by
    /// spec §6's serialization note. Only keys that are actually set are
    /// included, aside from the two guaranteed ones.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("strategy".to_string(), Value::String(self.strategy.clone()));
        map.insert(
            "content_type".to_string(),
            Value::String(self.content_type.as_str().to_string()),
        );

        if let Some(lang) = &self.language {
            map.insert("language".to_string(), Value::String(lang.clone()));
        }
        if self.atomic {
            map.insert("atomic".to_string(), Value::Bool(true));
        }
        if self.allow_oversize {
            map.insert("allow_oversize".to_string(), Value::Bool(true));
        }
        if let Some(path) = &self.header_path {
            map.insert(
                "header_path".to_string(),
                Value::Array(path.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(id) = &self.section_id {
            map.insert("section_id".to_string(), Value::String(id.clone()));
        }
        if self.has_overlap {
            map.insert("has_overlap".to_string(), Value::Bool(true));
        }
        if let Some(n) = self.overlap_size_chars {
            map.insert("overlap_size_chars".to_string(), Value::from(n));
        }
        if let Some(n) = self.overlap_source_chunk_index {
            map.insert("overlap_source_chunk_index".to_string(), Value::from(n));
        }
        if let Some(id) = &self.chunk_id {
            map.insert("chunk_id".to_string(), Value::String(id.clone()));
        }
        if let Some(id) = &self.parent_id {
            map.insert("parent_id".to_string(), Value::String(id.clone()));
        }
        if let Some(ids) = &self.children_ids {
            map.insert(
                "children_ids".to_string(),
                Value::Array(ids.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(id) = &self.prev_sibling_id {
            map.insert("prev_sibling_id".to_string(), Value::String(id.clone()));
        }
        if let Some(id) = &self.next_sibling_id {
            map.insert("next_sibling_id".to_string(), Value::String(id.clone()));
        }
        if let Some(n) = self.hierarchy_level {
            map.insert("hierarchy_level".to_string(), Value::from(n));
        }
        if let Some(b) = self.is_root {
            map.insert("is_root".to_string(), Value::Bool(b));
        }
        if let Some(b) = self.is_leaf {
            map.insert("is_leaf".to_string(), Value::Bool(b));
        }
        if let Some(role) = self.code_role {
            map.insert(
                "code_role".to_string(),
                Value::String(role.as_str().to_string()),
            );
        }
        if let Some(roles) = &self.code_roles {
            map.insert(
                "code_roles".to_string(),
                Value::Array(
                    roles
                        .iter()
                        .map(|r| Value::String(r.as_str().to_string()))
                        .collect(),
                ),
            );
        }
        if let Some(rel) = self.code_relationship {
            map.insert(
                "code_relationship".to_string(),
                Value::String(rel.as_str().to_string()),
            );
        }
        if let Some(s) = &self.explanation_before {
            map.insert("explanation_before".to_string(), Value::String(s.clone()));
        }
        if let Some(s) = &self.explanation_after {
            map.insert("explanation_after".to_string(), Value::String(s.clone()));
        }
        if let Some(n) = self.stream_window_index {
            map.insert("stream_window_index".to_string(), Value::from(n));
        }
        if let Some(n) = self.stream_chunk_index {
            map.insert("stream_chunk_index".to_string(), Value::from(n));
        }
        if let Some(n) = self.bytes_processed {
            map.insert("bytes_processed".to_string(), Value::from(n));
        }
        map
    }
}

/// A non-empty, contiguous span of source text tagged with metadata
/// (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(
        content: impl Into<String>,
        start_line: u32,
        end_line: u32,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            content: content.into(),
            start_line,
            end_line,
            metadata,
        }
    }

    /// Character count of `content`.
    pub fn size(&self) -> usize {
        self.content.chars().count()
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    pub fn is_empty_or_whitespace(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A link extracted from markdown content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// The display text of the link
    pub text: String,
    /// The link target (URL, path, or wiki-style reference)
    pub target: String,
    /// The type of link
    pub link_type: LinkType,
}

/// Types of links found in markdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkType {
    /// Standard markdown link `[text](url)`
    Markdown,
    /// Wiki-style link `[[page]]` or `[[page|text]]`
    Wiki,
    /// Reference-style link `[text][ref]`
    Reference,
    /// Autolink `<url>` or bare URL
    Autolink,
}

/// Extract all links from markdown content
pub fn extract_links(content: &str) -> Vec<Link> {
    let mut links = Vec::new();

    // Extract standard markdown links: [text](url)
    extract_markdown_links(content, &mut links);

    // Extract wiki-style links: [[page]] or [[page|text]]
    extract_wiki_links(content, &mut links);

    // Extract reference-style links: [text][ref]
    extract_reference_links(content, &mut links);

    // Extract autolinks: <url> and bare URLs
    extract_autolinks(content, &mut links);

    links
}

/// Extract standard markdown links `[text](url)`
fn extract_markdown_links(content: &str, links: &mut Vec<Link>) {
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '[' {
            // Check if this is an image link ![...] - skip those
            if i > 0 && content.as_bytes().get(i - 1) == Some(&b'!') {
                continue;
            }

            // Find matching ]
            let mut bracket_depth = 1;
            let mut text_end = None;
            let text_start = i + 1;

            for (j, ch) in chars.by_ref() {
                match ch {
                    '[' => bracket_depth += 1,
                    ']' => {
                        bracket_depth -= 1;
                        if bracket_depth == 0 {
                            text_end = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
            }

            if let Some(text_end) = text_end {
                // Check for (url) immediately after ]
                if let Some(&(_, '(')) = chars.peek() {
                    chars.next(); // consume '('
                    let url_start = text_end + 2;
                    let mut paren_depth = 1;
                    let mut url_end = None;

                    for (j, ch) in chars.by_ref() {
                        match ch {
                            '(' => paren_depth += 1,
                            ')' => {
                                paren_depth -= 1;
                                if paren_depth == 0 {
                                    url_end = Some(j);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }

                    if let Some(url_end) = url_end {
                        let text = &content[text_start..text_end];
                        let target = &content[url_start..url_end];

                        // Skip empty links and code-like patterns
                        if !text.is_empty() && !target.is_empty() {
                            // Remove title from URL if present: url "title" -> url
                            let target = target
                                .split_once(['"', '\''])
                                .map(|(url, _)| url.trim())
                                .unwrap_or(target)
                                .trim();

                            links.push(Link {
                                text: text.to_string(),
                                target: target.to_string(),
                                link_type: LinkType::Markdown,
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Extract wiki-style links `[[page]]` or `[[page|text]]`
fn extract_wiki_links(content: &str, links: &mut Vec<Link>) {
    let mut i = 0;
    let bytes = content.as_bytes();

    while i < bytes.len().saturating_sub(3) {
        if bytes[i] == b'[' && bytes[i + 1] == b'[' {
            // Found opening [[
            let start = i + 2;
            let mut end = None;

            // Find closing ]]
            for j in start..bytes.len().saturating_sub(1) {
                if bytes[j] == b']' && bytes[j + 1] == b']' {
                    end = Some(j);
                    break;
                }
            }

            if let Some(end) = end {
                let inner = &content[start..end];

                // Check for pipe separator: [[page|display text]]
                let (target, text) = if let Some(pipe_pos) = inner.find('|') {
                    (&inner[..pipe_pos], &inner[pipe_pos + 1..])
                } else {
                    (inner, inner)
                };

                if !target.is_empty() {
                    links.push(Link {
                        text: text.trim().to_string(),
                        target: target.trim().to_string(),
                        link_type: LinkType::Wiki,
                    });
                }

                i = end + 2;
                continue;
            }
        }
        i += 1;
    }
}

/// Extract reference-style links `[text][ref]`
fn extract_reference_links(content: &str, links: &mut Vec<Link>) {
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '[' {
            // Check if this is an image link ![...] - skip those
            if i > 0 && content.as_bytes().get(i - 1) == Some(&b'!') {
                continue;
            }

            // Find matching ]
            let mut bracket_depth = 1;
            let mut text_end = None;
            let text_start = i + 1;

            for (j, ch) in chars.by_ref() {
                match ch {
                    '[' => bracket_depth += 1,
                    ']' => {
                        bracket_depth -= 1;
                        if bracket_depth == 0 {
                            text_end = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
            }

            if let Some(text_end) = text_end {
                // Check for [ref] immediately after ]
                if let Some(&(_, '[')) = chars.peek() {
                    chars.next(); // consume '['
                    let ref_start = text_end + 2;
                    let mut ref_end = None;

                    for (j, ch) in chars.by_ref() {
                        if ch == ']' {
                            ref_end = Some(j);
                            break;
                        }
                    }

                    if let Some(ref_end) = ref_end {
                        let text = &content[text_start..text_end];
                        let reference = &content[ref_start..ref_end];

                        // Skip empty references
                        if !text.is_empty() {
                            // If reference is empty, use text as reference
                            let target = if reference.is_empty() {
                                text
                            } else {
                                reference
                            };

                            links.push(Link {
                                text: text.to_string(),
                                target: target.to_string(),
                                link_type: LinkType::Reference,
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Extract autolinks `<url>` and bare URLs
fn extract_autolinks(content: &str, links: &mut Vec<Link>) {
    // Extract angle-bracket autolinks: <https://example.com>
    let mut i = 0;
    let bytes = content.as_bytes();

    while i < bytes.len() {
        if bytes[i] == b'<' {
            // Look for closing >
            let start = i + 1;
            if let Some(end_offset) = content[start..].find('>') {
                let inner = &content[start..start + end_offset];

                // Check if it looks like a URL
                if inner.starts_with("http://")
                    || inner.starts_with("https://")
                    || inner.starts_with("mailto:")
                    || inner.starts_with("ftp://")
                {
                    links.push(Link {
                        text: inner.to_string(),
                        target: inner.to_string(),
                        link_type: LinkType::Autolink,
                    });
                }
                i = start + end_offset + 1;
                continue;
            }
        }
        i += 1;
    }
}
