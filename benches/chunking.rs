use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use doc_chunker::{ChunkConfig, Chunker, SelectorMode, StreamingConfig};
use std::io::Cursor;

fn generate_markdown(word_count: usize) -> String {
    let mut content = String::new();
    content.push_str("# Main Title\n\n");

    let mut words_written = 2;
    let mut section = 1;

    while words_written < word_count {
        content.push_str(&format!("\n## Section {}\n\n", section));
        words_written += 2;

        let paragraph_size = (word_count - words_written).min(100);
        for i in 0..paragraph_size {
            content.push_str("word ");
            words_written += 1;

            if i % 20 == 19 {
                content.push_str("sentence. ");
            }
        }

        content.push_str("\n\n");

        if section % 3 == 0 && words_written < word_count.saturating_sub(50) {
            content.push_str("```rust\n");
            content.push_str("fn example() {\n");
            content.push_str("    println!(\"Hello, world!\");\n");
            content.push_str("}\n");
            content.push_str("```\n\n");
            words_written += 10;
        }

        if section % 4 == 0 && words_written < word_count.saturating_sub(30) {
            for i in 1..=5 {
                content.push_str(&format!("- List item {} with some content\n", i));
                words_written += 5;
            }
            content.push('\n');
        }

        section += 1;

        if words_written >= word_count {
            break;
        }
    }

    content
}

fn benchmark_varying_sizes(c: &mut Criterion) {
    let _ = env_logger::try_init();

    let mut group = c.benchmark_group("document_size");

    for size in [1_000, 5_000, 10_000, 50_000, 100_000].iter() {
        let markdown = generate_markdown(*size);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_words", size)),
            &markdown,
            |b, md| {
                let chunker = Chunker::default();
                b.iter(|| {
                    let result = chunker.chunk(black_box(md));
                    black_box(result)
                });
            },
        );
    }

    group.finish();
}

fn benchmark_configurations(c: &mut Criterion) {
    let markdown = generate_markdown(10_000);
    let mut group = c.benchmark_group("configurations");

    group.bench_function("balanced", |b| {
        let chunker = Chunker::default();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });

    group.bench_function("dense_retrieval", |b| {
        let chunker = Chunker::new(ChunkConfig::dense_retrieval()).unwrap();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });

    group.bench_function("large_context", |b| {
        let chunker = Chunker::new(ChunkConfig::large_context()).unwrap();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });

    group.bench_function("no_overlap", |b| {
        let chunker = Chunker::new(ChunkConfig {
            enable_overlap: false,
            ..ChunkConfig::balanced()
        })
        .unwrap();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });

    group.bench_function("weighted_selector", |b| {
        let chunker = Chunker::new(ChunkConfig {
            selector_mode: SelectorMode::Weighted,
            ..ChunkConfig::balanced()
        })
        .unwrap();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });

    group.finish();
}

fn benchmark_code_heavy(c: &mut Criterion) {
    let mut markdown = String::new();
    markdown.push_str("# API Documentation\n\n");

    for i in 0..50 {
        markdown.push_str(&format!("## Function {}\n\n", i));
        markdown.push_str("This function does something important.\n\n");
        markdown.push_str("```rust\n");
        markdown.push_str(&format!(
            "pub fn function_{}(param: i32) -> Result<(), Error> {{\n",
            i
        ));
        markdown.push_str("    // Implementation\n");
        markdown.push_str("    let result = complex_operation(param);\n");
        markdown.push_str("    validate_result(&result)?;\n");
        markdown.push_str("    Ok(())\n");
        markdown.push_str("}\n");
        markdown.push_str("```\n\n");
    }

    c.bench_function("code_heavy_document", |b| {
        let chunker = Chunker::default();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });
}

fn benchmark_multilingual(c: &mut Criterion) {
    let mut markdown = String::new();

    markdown.push_str("# はじめに\n\n");
    markdown.push_str("これは日本語のテキストです。");
    markdown.push_str("複数の文章が含まれています。");
    markdown.push_str("RAGシステムのためのチャンキングをテストします。\n\n");

    markdown.push_str("## 詳細\n\n");
    for _ in 0..100 {
        markdown.push_str("これはサンプルテキストです。");
    }
    markdown.push_str("\n\n");

    markdown.push_str("# 介绍\n\n");
    markdown.push_str("这是中文文本。");
    markdown.push_str("包含多个句子。");
    markdown.push_str("测试RAG系统的分块功能。\n\n");

    markdown.push_str("## 详情\n\n");
    for _ in 0..100 {
        markdown.push_str("这是示例文本。");
    }

    c.bench_function("multilingual_cjk", |b| {
        let chunker = Chunker::default();
        b.iter(|| black_box(chunker.chunk(black_box(&markdown))));
    });
}

fn benchmark_hierarchical(c: &mut Criterion) {
    let markdown = generate_markdown(20_000);
    c.bench_function("hierarchical_chunking", |b| {
        let chunker = Chunker::default();
        b.iter(|| black_box(chunker.chunk_hierarchical(black_box(&markdown))));
    });
}

fn benchmark_streaming(c: &mut Criterion) {
    let markdown = generate_markdown(100_000);
    let mut group = c.benchmark_group("streaming");

    for buffer_size in [8 * 1024, 64 * 1024, 256 * 1024].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("buffer_{}", buffer_size)),
            buffer_size,
            |b, &buffer_size| {
                let chunker = Chunker::default();
                let streaming_config = StreamingConfig {
                    buffer_size,
                    ..StreamingConfig::default()
                };
                b.iter(|| {
                    let cursor = Cursor::new(markdown.as_bytes().to_vec());
                    let stream = chunker
                        .chunk_stream(black_box(cursor), streaming_config)
                        .unwrap();
                    let count = stream.filter_map(|r| r.ok()).count();
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_varying_sizes,
    benchmark_configurations,
    benchmark_code_heavy,
    benchmark_multilingual,
    benchmark_hierarchical,
    benchmark_streaming
);
criterion_main!(benches);
