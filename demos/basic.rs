use doc_chunker::Chunker;

fn main() {
    let markdown = r#"
# Introduction to Rust

Rust is a systems programming language that focuses on safety, speed, and concurrency.

## Memory Safety

Rust's ownership system ensures memory safety without needing a garbage collector.
This makes it ideal for systems programming where performance is critical.

## Concurrency

Rust's type system helps prevent data races at compile time, making concurrent
programming safer and more reliable.

```rust
use std::thread;

fn main() {
    let handle = thread::spawn(|| {
        println!("Hello from a thread!");
    });

    handle.join().unwrap();
}
```

## Performance

Rust provides zero-cost abstractions, meaning you don't pay for features you don't use.
The compiled code runs as fast as equivalent C or C++ code.

## Conclusion

Rust combines the performance of low-level languages with the safety of high-level
languages, making it an excellent choice for modern systems programming.
"#;

    println!("Chunking markdown document...\n");

    let chunker = Chunker::default();
    let result = chunker.chunk(markdown).expect("chunking should not fail");

    println!("Generated {} chunks via '{}':\n", result.chunk_count(), result.strategy_used);
    println!("{}", "=".repeat(80));

    for (i, chunk) in result.chunks.iter().enumerate() {
        println!("\nChunk #{}", i + 1);
        println!("   Content type: {:?}", chunk.metadata.content_type);
        println!("   Strategy: {}", chunk.metadata.strategy);
        println!("   Characters: {}", chunk.size());
        println!("   Lines: {}-{}", chunk.start_line, chunk.end_line);

        if let Some(path) = &chunk.metadata.header_path {
            println!("   Headers: {}", path.join(" > "));
        }

        let preview: String = chunk.content.chars().take(100).collect();
        println!("   Preview: {}", preview.replace('\n', " "));

        println!("{}", "-".repeat(80));
    }

    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &result.warnings {
            println!("  - {w}");
        }
    }

    println!("\nChunking complete.");
}
