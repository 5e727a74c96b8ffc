use doc_chunker::{Chunk, ChunkConfig, ChunkContentType, Chunker};

fn main() {
    let markdown = r#"
# Advanced Markdown Chunking

This example demonstrates advanced features and configuration options.

## Custom Configuration

You can customize the chunking behavior using `ChunkConfig`.

### Size Limits

Control the size of chunks by setting minimum, maximum, and target chunk sizes.

### Overlap Strategy

Sentence-aligned overlap maintains context between chunks by including
whole trailing sentences from the previous chunk.

## Tables

| Feature | Description | Status |
|---------|-------------|--------|
| Hierarchy | Navigable parent/child tree | done |
| Code Blocks | Never split | done |
| Tables | Preserved | done |

## Lists

- First item with some content
- Second item with more details
  - Nested item
  - Another nested item
- Third item

## Code Examples

```python
def process_chunks(chunks):
    for i, chunk in enumerate(chunks):
        print(f"Chunk {i}: {len(chunk.content)} chars")
```

## Blockquotes

> This is a blockquote that should be preserved as a single unit.
> It can span multiple lines and maintain its structure.
>
> Even with blank lines in between.

## Conclusion

The chunker handles all these markdown elements intelligently.
"#;

    println!("=== Comparison of Different Configurations ===\n");

    println!("1) Balanced (default)");
    let balanced = Chunker::default();
    let result_balanced = balanced.chunk(markdown).expect("chunking should not fail");
    print_summary(&result_balanced.chunks);

    println!("\n2) Dense retrieval preset");
    let dense = Chunker::new(ChunkConfig::dense_retrieval()).unwrap();
    let result_dense = dense.chunk(markdown).expect("chunking should not fail");
    print_summary(&result_dense.chunks);

    println!("\n3) Large context preset");
    let large = Chunker::new(ChunkConfig::large_context()).unwrap();
    let result_large = large.chunk(markdown).expect("chunking should not fail");
    print_summary(&result_large.chunks);

    println!("\n4) No overlap");
    let no_overlap = Chunker::new(ChunkConfig {
        enable_overlap: false,
        ..ChunkConfig::balanced()
    })
    .unwrap();
    let result_no_overlap = no_overlap.chunk(markdown).expect("chunking should not fail");
    print_summary(&result_no_overlap.chunks);

    println!("\n=== Hierarchical View (Balanced Configuration) ===\n");
    let hierarchical = balanced
        .chunk_hierarchical(markdown)
        .expect("hierarchical chunking should not fail");

    for chunk in hierarchical.chunks() {
        let level = chunk.metadata.hierarchy_level.unwrap_or(0);
        let indent = "  ".repeat(level as usize);
        let label = chunk
            .metadata
            .header_path
            .as_ref()
            .and_then(|p| p.last())
            .cloned()
            .unwrap_or_else(|| chunk.metadata.content_type.as_str().to_string());
        println!("{indent}- {label} ({} chars)", chunk.size());
    }
}

fn print_summary(chunks: &[Chunk]) {
    let total_chars: usize = chunks.iter().map(|c| c.size()).sum();
    let avg_chars = if !chunks.is_empty() {
        total_chars / chunks.len()
    } else {
        0
    };

    let code = chunks
        .iter()
        .filter(|c| c.metadata.content_type == ChunkContentType::Code)
        .count();
    let tables = chunks
        .iter()
        .filter(|c| c.metadata.content_type == ChunkContentType::Table)
        .count();
    let lists = chunks
        .iter()
        .filter(|c| c.metadata.content_type == ChunkContentType::List)
        .count();

    println!("   Chunks: {}", chunks.len());
    println!("   Total chars: {total_chars}");
    println!("   Avg chars/chunk: {avg_chars}");
    println!("   Code chunks: {code}");
    println!("   Table chunks: {tables}");
    println!("   List chunks: {lists}");
}
