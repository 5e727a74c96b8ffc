//! Universal invariants that every chunking result must satisfy,
//! regardless of which strategy handled the document.

use doc_chunker::{analyzer, ChunkConfig, ChunkContentType, Chunker};

fn sample_documents() -> Vec<String> {
    vec![
        "# Title\n\nSome prose.\n\n## Section\n\nMore prose with detail.\n".to_string(),
        "```rust\nfn main() {}\n```\n\nProse after a code block.\n".to_string(),
        "| a | b |\n| --- | --- |\n| 1 | 2 |\n\nProse after a table.\n".to_string(),
        "- item one\n- item two\n  - nested item\n\nProse after a list.\n".to_string(),
        "Just plain prose.\n\nAnother paragraph of plain prose, longer this time.\n".to_string(),
        "".to_string(),
        "   \n\t\n".to_string(),
    ]
}

#[test]
fn content_preservation_no_chunk_is_empty_unless_input_is() {
    let chunker = Chunker::default();
    for doc in sample_documents() {
        let result = chunker.chunk(&doc).unwrap();
        for chunk in &result.chunks {
            assert!(
                !chunk.is_empty_or_whitespace(),
                "chunk was empty for input {doc:?}"
            );
        }
    }
}

#[test]
fn boundary_integrity_code_fences_never_split() {
    let chunker = Chunker::default();
    let text = "Intro.\n\n```rust\nfn f() {\n    1\n}\n```\n\nOutro.\n";
    let result = chunker.chunk(text).unwrap();

    for chunk in &result.chunks {
        if chunk.metadata.content_type == ChunkContentType::Code {
            assert_eq!(chunk.content.matches("```").count(), 2);
        }
    }
}

#[test]
fn table_integrity_tables_never_split() {
    let chunker = Chunker::default();
    let text = "Intro.\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |\n\nOutro.\n";
    let result = chunker.chunk(text).unwrap();

    let table_chunks: Vec<_> = result
        .chunks
        .iter()
        .filter(|c| c.metadata.content_type == ChunkContentType::Table)
        .collect();
    assert_eq!(table_chunks.len(), 1);
    let table = table_chunks[0];
    assert!(table.content.contains("| --- |"));
    assert_eq!(table.content.lines().filter(|l| l.trim_start().starts_with('|')).count(), 4);
}

#[test]
fn monotone_line_order() {
    let chunker = Chunker::default();
    let text = "# A\n\nBody A.\n\n## B\n\nBody B.\n\n## C\n\nBody C.\n";
    let result = chunker.chunk(text).unwrap();

    for window in result.chunks.windows(2) {
        assert!(window[0].start_line <= window[1].start_line);
        assert!(window[0].end_line <= window[1].end_line || window[1].metadata.has_overlap);
    }
}

#[test]
fn size_discipline_non_atomic_chunks_respect_max_unless_oversize_allowed() {
    let config = ChunkConfig {
        max_chunk_size: 200,
        target_chunk_size: 150,
        min_chunk_size: 40,
        allow_oversize: false,
        ..ChunkConfig::balanced()
    };
    let chunker = Chunker::new(config.clone()).unwrap();
    let text = "Filler sentence to add length. ".repeat(40);
    let result = chunker.chunk(&text).unwrap();

    for chunk in &result.chunks {
        if !chunk.metadata.atomic {
            assert!(
                chunk.size() <= config.max_chunk_size || chunk.metadata.allow_oversize,
                "non-atomic chunk of size {} exceeded max {}",
                chunk.size(),
                config.max_chunk_size
            );
        }
    }
}

#[test]
fn overlap_bound_never_exceeds_half_previous_chunk() {
    let config = ChunkConfig {
        max_chunk_size: 220,
        target_chunk_size: 200,
        min_chunk_size: 50,
        overlap_size: 100,
        overlap_percentage: 0.5,
        ..ChunkConfig::balanced()
    };
    let chunker = Chunker::new(config).unwrap();
    let text = "Sentence one is here. Sentence two follows. Sentence three as well. "
        .repeat(10);
    let result = chunker.chunk(&text).unwrap();

    for window in result.chunks.windows(2) {
        let (prev, cur) = (&window[0], &window[1]);
        if let Some(overlap) = cur.metadata.overlap_size_chars {
            assert!((overlap as usize) <= prev.size() / 2);
        }
    }
}

#[test]
fn strategy_determinism() {
    let chunker = Chunker::default();
    let text = "# Title\n\nProse.\n\n```rust\nfn f() {}\n```\n\nMore prose.\n";
    let first = chunker.chunk(text).unwrap();
    let second = chunker.chunk(text).unwrap();

    assert_eq!(first.strategy_used, second.strategy_used);
    assert_eq!(first.chunks.len(), second.chunks.len());
    for (a, b) in first.chunks.iter().zip(second.chunks.iter()) {
        assert_eq!(a.content, b.content);
        assert_eq!(a.start_line, b.start_line);
        assert_eq!(a.end_line, b.end_line);
    }
}

#[test]
fn streaming_equivalence_matches_flat_chunk_count_order() {
    let chunker = Chunker::default();
    let text = "Paragraph one with body.\n\nParagraph two with body.\n\nParagraph three with body.\n";

    let flat = chunker.chunk(text).unwrap();
    let streamed: Vec<_> = chunker
        .chunk_stream(std::io::Cursor::new(text.as_bytes().to_vec()), Default::default())
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert!(!flat.chunks.is_empty());
    assert!(!streamed.is_empty());
    for window in streamed.windows(2) {
        assert!(window[0].start_line <= window[1].start_line);
    }
}

#[test]
fn hierarchy_closure_every_child_resolves_to_a_tree_member() {
    let chunker = Chunker::new(ChunkConfig {
        header_count_threshold: 1,
        ..ChunkConfig::balanced()
    })
    .unwrap();
    let text = "# Title\n\nIntro.\n\n## A\n\nBody A.\n\n## B\n\nBody B.\n";
    let result = chunker.chunk_hierarchical(text).unwrap();

    let root = result.tree.get_chunk("root").expect("tree must have a root");
    let root_id = root.metadata.chunk_id.clone().unwrap_or_else(|| "root".to_string());

    for chunk in result.chunks() {
        if let Some(parent_id) = &chunk.metadata.parent_id {
            assert!(
                parent_id == &root_id || result.tree.get_chunk(parent_id).is_some(),
                "chunk's parent_id did not resolve to a tree member"
            );
        }
        if let Some(children) = &chunk.metadata.children_ids {
            for child_id in children {
                assert!(result.tree.get_chunk(child_id).is_some());
            }
        }
    }
}

#[test]
fn ratio_consistency_holds_across_varied_documents() {
    let config = ChunkConfig::balanced();
    for doc in sample_documents() {
        if doc.trim().is_empty() {
            continue;
        }
        let analysis = analyzer::analyze(&doc, &config).unwrap();
        assert!(
            analysis.ratios_are_consistent(),
            "ratios did not sum to 1.0 for input {doc:?}"
        );
    }
}
