//! Model matching benchmarks
//!
//! Measures the non-I/O parts of session setup: similarity scoring, model
//! selection over catalogs of different sizes, and config parsing.
//!
//! ## Expected Performance Characteristics
//!
//! - Similarity ratio: sub-microsecond for typical model identifiers
//! - Model selection: linear in catalog size, tens of microseconds for 100 models
//! - Config parsing: single-digit microseconds (one-time startup cost)
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lmtic::{ModelInfo, config::Config, select_model, similarity_ratio};
use std::hint::black_box;
use std::str::FromStr;

fn catalog(size: usize) -> Vec<ModelInfo> {
    let families = ["qwen2.5", "llama3.1", "mistral", "phi3", "gemma2", "deepseek-r1"];
    (0..size)
        .map(|i| {
            let family = families[i % families.len()];
            ModelInfo::new(format!("{}:{}b-instruct-q{}", family, 7 + i, i % 8), "library")
        })
        .collect()
}

/// Benchmark the similarity ratio on identifier-sized inputs
fn bench_similarity_ratio(c: &mut Criterion) {
    let pairs = vec![
        ("short", ("qwen", "qwen2.5:7b")),
        ("medium", ("llama3", "meta-llama-3.1-8b-instruct")),
        (
            "long",
            (
                "deepseek-coder",
                "lmstudio-community/DeepSeek-Coder-V2-Lite-Instruct-GGUF",
            ),
        ),
    ];

    let mut group = c.benchmark_group("similarity_ratio");

    for (name, (requested, id)) in pairs {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(requested, id),
            |b, (r, i)| {
                b.iter(|| similarity_ratio(black_box(i), black_box(r)));
            },
        );
    }

    group.finish();
}

/// Benchmark selection with no exact match, so every model is scored
fn bench_select_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_model");

    for size in [5, 25, 100] {
        let models = catalog(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &models, |b, m| {
            b.iter(|| select_model(black_box(m), black_box("qwen")));
        });
    }

    group.finish();
}

/// Benchmark config parsing and validation
///
/// Runs once per CLI invocation.
fn bench_config_parsing(c: &mut Criterion) {
    let toml_str = r#"
[session]
model = "qwen"
probe_timeout_seconds = 2

[[endpoints]]
name = "lmstudio"
host = "localhost"
port = 1234

[[endpoints]]
name = "ollama"
host = "localhost"
port = 11434

[agent]
max_tokens = 2048
temperature = 0.7
request_timeout_seconds = 120
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| Config::from_str(black_box(toml_str)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_similarity_ratio,
    bench_select_model,
    bench_config_parsing,
);
criterion_main!(benches);
