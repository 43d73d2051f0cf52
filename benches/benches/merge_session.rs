//! Benchmarks for a live merge session
//!
//! Performance-critical paths:
//! - `recompute`: diffing plus anchoring the whole sequence
//! - edit propagation: every keystroke adjusts every live span
//! - `to_virtual`: line mapping on each scroll

#![allow(missing_docs)]

use std::ops::Range;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mergeview_engine::{
    Contributor, Document, DocumentMerger, MergeConfig, MergeEvent, MergeHost, SharedDocument,
};

struct Host {
    left: SharedDocument,
    right: SharedDocument,
}

impl MergeHost for Host {
    fn document(&self, contributor: Contributor) -> Option<SharedDocument> {
        match contributor {
            Contributor::Left => Some(self.left.clone()),
            Contributor::Right => Some(self.right.clone()),
            Contributor::Ancestor => None,
        }
    }

    fn working_region(&self, _contributor: Contributor) -> Option<Range<usize>> {
        None
    }

    fn config(&self) -> MergeConfig {
        MergeConfig::default()
    }

    fn notify(&self, _event: &MergeEvent) {}
}

fn session(lines: usize) -> (DocumentMerger<Host>, SharedDocument) {
    let left: String = (0..lines).map(|i| format!("line {i}\n")).collect();
    let right: String = (0..lines)
        .map(|i| {
            if i % 20 == 0 {
                format!("edited {i}\n")
            } else {
                format!("line {i}\n")
            }
        })
        .collect();
    let left = Document::shared(left);
    let host = Host {
        left: left.clone(),
        right: Document::shared(right),
    };
    let mut merger = DocumentMerger::new(host);
    merger.bind().unwrap();
    merger.recompute().unwrap();
    (merger, left)
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_session/recompute");

    for lines in [200usize, 2_000] {
        let (mut merger, _) = session(lines);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{lines}_lines")),
            &lines,
            |b, _| b.iter(|| black_box(merger.recompute().map(|s| s.len()))),
        );
    }

    group.finish();
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_session/typing");

    for lines in [200usize, 2_000] {
        let (merger, left) = session(lines);
        let middle = left.borrow().len() / 2;
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{lines}_lines")),
            &middle,
            |b, &offset| {
                b.iter(|| {
                    let mut doc = left.borrow_mut();
                    doc.insert(black_box(offset), "x").unwrap();
                    doc.delete(offset, 1).unwrap();
                });
            },
        );
        black_box(merger.generation());
    }

    group.finish();
}

fn bench_line_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_session/to_virtual");
    let (merger, _) = session(2_000);

    group.bench_function("2000_lines", |b| {
        b.iter(|| {
            (0..2_000)
                .step_by(37)
                .map(|line| merger.to_virtual(Contributor::Left, black_box(line)))
                .sum::<usize>()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_recompute, bench_typing, bench_line_mapping);
criterion_main!(benches);
