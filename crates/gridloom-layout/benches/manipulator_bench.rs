//! Benchmarks for structural edits on grids of growing size.
//!
//! Run with: cargo bench -p gridloom-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use gridloom_layout::{
    CellType, GridTree, add_cell, add_placeholders, add_resizers, add_row, clean_grid,
    remove_placeholders, set_ids,
};
use std::hint::black_box;

/// `rows` rows of `cols` modules, every other module split into two rows.
fn make_grid(rows: usize, cols: usize) -> GridTree {
    let mut tree = GridTree::new("bench", "4px");
    let root = tree.root();
    for r in 0..rows {
        let row = add_row(&mut tree, root, None, false).expect("row");
        for c in 0..cols {
            let cell = add_cell(&mut tree, row, None, CellType::Module, None).expect("cell");
            if (r + c) % 2 == 0 {
                let extra = add_row(&mut tree, cell, None, false).expect("nested row");
                add_cell(&mut tree, extra, None, CellType::Module, None).expect("nested cell");
            }
        }
    }
    set_ids(&mut tree).expect("ids");
    tree
}

fn bench_placeholders(c: &mut Criterion) {
    let mut group = c.benchmark_group("manipulator/placeholders");
    for n in [2, 4, 8, 16] {
        let tree = make_grid(n, n);
        group.bench_with_input(BenchmarkId::new("add_remove", n), &tree, |b, tree| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    let root = tree.root();
                    add_placeholders(&mut tree, root).expect("add");
                    remove_placeholders(&mut tree, root).expect("remove");
                    black_box(tree)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_resizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("manipulator/resizers");
    for n in [4, 16] {
        let tree = make_grid(n, n);
        group.bench_with_input(BenchmarkId::new("add", n), &tree, |b, tree| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    let root = tree.root();
                    add_resizers(&mut tree, root).expect("add");
                    black_box(tree)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("manipulator/clean");
    for n in [4, 16] {
        let tree = make_grid(n, n);
        group.bench_with_input(BenchmarkId::new("noop", n), &tree, |b, tree| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    let root = tree.root();
                    clean_grid(&mut tree, root).expect("clean");
                    black_box(tree)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_text_form(c: &mut Criterion) {
    let tree = make_grid(8, 8);
    let xml = tree.to_xml().expect("serialize");
    c.bench_function("xml/serialize_8x8", |b| {
        b.iter(|| black_box(tree.to_xml().expect("serialize")))
    });
    c.bench_function("xml/parse_8x8", |b| {
        b.iter(|| black_box(GridTree::from_xml(&xml).expect("parse")))
    });
}

criterion_group!(
    benches,
    bench_placeholders,
    bench_resizers,
    bench_clean,
    bench_text_form
);
criterion_main!(benches);
