//! Benchmarks for the line and token differencers
//!
//! Performance-critical paths:
//! - `LineComparator::new`: splitting and hashing a document into lines
//! - `diff_two_way`: Myers search between two documents
//! - `diff_three_way`: two searches plus hunk combination

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mergeview_engine::DiffLimits;
use mergeview_engine::comparator::{LineComparator, TokenComparator};
use mergeview_engine::diff::{MyersDiff, diff_three_way, diff_two_way};

/// A source-like document of `lines` lines.
fn document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("    let value_{i} = compute({i}, {});\n", i % 7))
        .collect()
}

/// `text` with every `every`-th line rewritten.
fn edited(text: &str, every: usize, tag: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i % every == 0 {
                format!("{line} // {tag}\n")
            } else {
                format!("{line}\n")
            }
        })
        .collect()
}

fn bench_line_comparator(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_diff/comparator");

    for lines in [100usize, 1_000, 10_000] {
        let text = document(lines);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{lines}_lines")),
            &text,
            |b, text| b.iter(|| LineComparator::new(black_box(text), false)),
        );
    }

    group.finish();
}

fn bench_two_way(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_diff/two_way");
    let limits = DiffLimits::unbounded();

    // Sparse edits are the common case in a compare view
    let cases = [("sparse", 50usize), ("dense", 3)];

    for lines in [100usize, 1_000, 5_000] {
        let base = document(lines);
        for (name, every) in cases {
            let target = edited(&base, every, "changed");
            let left = LineComparator::new(&base, false);
            let right = LineComparator::new(&target, false);

            group.throughput(Throughput::Elements(lines as u64));
            group.bench_with_input(
                BenchmarkId::new(name, format!("{lines}_lines")),
                &lines,
                |b, _| {
                    b.iter(|| {
                        diff_two_way(black_box(&left), black_box(&right), &MyersDiff, &limits)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_three_way(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_diff/three_way");
    let limits = DiffLimits::unbounded();

    for lines in [100usize, 1_000, 5_000] {
        let base = document(lines);
        let left_text = edited(&base, 40, "left");
        let right_text = edited(&base, 25, "right");
        let ancestor = LineComparator::new(&base, false);
        let left = LineComparator::new(&left_text, false);
        let right = LineComparator::new(&right_text, false);

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{lines}_lines")),
            &lines,
            |b, _| {
                b.iter(|| {
                    diff_three_way(
                        black_box(&ancestor),
                        black_box(&left),
                        black_box(&right),
                        &MyersDiff,
                        &limits,
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_whitespace(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_diff/ignore_whitespace");
    let limits = DiffLimits::unbounded();
    let base = document(1_000);
    let target = base.replace("    ", "\t");

    for ignore in [false, true] {
        group.bench_function(format!("ignore_{ignore}"), |b| {
            b.iter(|| {
                let left = LineComparator::new(black_box(&base), ignore);
                let right = LineComparator::new(black_box(&target), ignore);
                black_box(diff_two_way(&left, &right, &MyersDiff, &limits))
            });
        });
    }

    group.finish();
}

fn bench_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_diff/tokens");
    let limits = DiffLimits::unbounded();
    let base = "let total = price * count + tax(price, rate) - discount;";
    let target = "let total = cost * amount + tax(cost, rate) - rebate;";

    group.bench_function("single_line", |b| {
        b.iter(|| {
            let left = TokenComparator::new(black_box(base), false);
            let right = TokenComparator::new(black_box(target), false);
            black_box(diff_two_way(&left, &right, &MyersDiff, &limits))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_line_comparator,
    bench_two_way,
    bench_three_way,
    bench_whitespace,
    bench_tokens
);
criterion_main!(benches);
