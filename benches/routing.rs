// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for routing and the cheap parts of the call path.
//!
//! These run without network calls:
//! - Model selection over the default catalog
//! - Token estimation
//! - Stats recording
//! - Orchestrator construction from settings
//!
//! Run with: `cargo bench --bench routing`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use switchyard::config::Settings;
use switchyard::orchestrator::catalog;
use switchyard::orchestrator::router::CandidateView;
use switchyard::providers::{estimate_tokens, StatsRecorder};
use switchyard::{
    build_orchestrator, BackendConfig, Capability, Complexity, ModelId, ModelResponse,
    RoutingTable, TaskRequest,
};

fn lookup(id: ModelId) -> Option<CandidateView<'static>> {
    catalog::all_models()
        .find(|config| config.id == id)
        .map(|config| CandidateView {
            config,
            available: true,
        })
}

/// Benchmark model selection for the common request shapes.
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let table = RoutingTable::default();

    let requests = [
        ("general", TaskRequest::new("hello")),
        (
            "code_expert",
            TaskRequest::new("x")
                .with_task_type("code_generation")
                .with_complexity(Complexity::Expert)
                .require(Capability::CodeGeneration),
        ),
        ("high_priority", TaskRequest::new("x").with_priority(9)),
        (
            "unsatisfiable",
            TaskRequest::new("x")
                .require(Capability::Specialized)
                .require(Capability::Creativity),
        ),
    ];

    for (name, request) in &requests {
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            b.iter(|| black_box(table.select(request, lookup)))
        });
    }

    group.finish();
}

/// Benchmark the word-based token estimate.
fn bench_estimate_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_tokens");

    for words in [10usize, 1_000, 10_000] {
        let text = "lorem ipsum ".repeat(words / 2);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, text| {
            b.iter(|| black_box(estimate_tokens(text)))
        });
    }

    group.finish();
}

/// Benchmark recording into a provider's stats.
fn bench_stats_record(c: &mut Criterion) {
    let recorder = StatsRecorder::new();
    let response = ModelResponse::success(
        "bench",
        ModelId::ClaudeHaiku,
        "done",
        42,
        0.0001,
        std::time::Duration::from_millis(120),
    );

    c.bench_function("stats_record", |b| {
        b.iter(|| recorder.record(black_box(&response)))
    });
}

/// Benchmark building an orchestrator with every backend configured.
fn bench_build_orchestrator(c: &mut Criterion) {
    let settings = Settings {
        anthropic: BackendConfig::with_api_key("sk-ant-bench"),
        openai: BackendConfig::with_api_key("sk-bench"),
        ..Default::default()
    };

    c.bench_function("build_orchestrator", |b| {
        b.iter(|| black_box(build_orchestrator(&settings)))
    });
}

criterion_group!(
    benches,
    bench_select,
    bench_estimate_tokens,
    bench_stats_record,
    bench_build_orchestrator,
);
criterion_main!(benches);
