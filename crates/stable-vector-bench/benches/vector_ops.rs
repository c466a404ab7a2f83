//! Criterion benchmarks: populate, destroy, pop_back and iteration, each for
//! `Vec` and `StableVec` at every size in `SIZES`.

use std::hint::black_box;

use criterion::measurement::WallTime;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkGroup, BenchmarkId, Criterion};
use stable_vector::StableVec;
use stable_vector_bench::{drain_back, populate, Container, SIZES};

type Group<'a> = BenchmarkGroup<'a, WallTime>;

fn populate_one<C: Container>(group: &mut Group<'_>, n: usize) {
    group.bench_with_input(BenchmarkId::new(C::NAME, n), &n, |b, &n| {
        b.iter_batched(
            C::default,
            |mut v| {
                for i in 0..n {
                    v.push(i);
                }
                v
            },
            BatchSize::SmallInput,
        );
    });
}

fn destroy_one<C: Container>(group: &mut Group<'_>, n: usize) {
    group.bench_with_input(BenchmarkId::new(C::NAME, n), &n, |b, &n| {
        b.iter_batched(|| populate::<C>(n), drop, BatchSize::SmallInput);
    });
}

fn pop_back_one<C: Container>(group: &mut Group<'_>, n: usize) {
    group.bench_with_input(BenchmarkId::new(C::NAME, n), &n, |b, &n| {
        b.iter_batched(
            || populate::<C>(n),
            |mut v| black_box(drain_back(&mut v)),
            BatchSize::SmallInput,
        );
    });
}

fn forward_one<C: Container>(group: &mut Group<'_>, n: usize) {
    let v = populate::<C>(n);
    group.bench_with_input(BenchmarkId::new(C::NAME, n), &v, |b, v| {
        b.iter(|| black_box(v.sum_forward()));
    });
}

fn backward_one<C: Container>(group: &mut Group<'_>, n: usize) {
    let v = populate::<C>(n);
    group.bench_with_input(BenchmarkId::new(C::NAME, n), &v, |b, v| {
        b.iter(|| black_box(v.sum_backward()));
    });
}

/// Benchmark: push `0..n` into a fresh container.
fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");
    for n in SIZES {
        populate_one::<Vec<usize>>(&mut group, n);
        populate_one::<StableVec<usize>>(&mut group, n);
    }
    group.finish();
}

/// Benchmark: drop a container of `n` elements.
fn bench_destroy(c: &mut Criterion) {
    let mut group = c.benchmark_group("destroy");
    for n in SIZES {
        destroy_one::<Vec<usize>>(&mut group, n);
        destroy_one::<StableVec<usize>>(&mut group, n);
    }
    group.finish();
}

/// Benchmark: pop every element, summing as we go.
fn bench_pop_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("pop_back");
    for n in SIZES {
        pop_back_one::<Vec<usize>>(&mut group, n);
        pop_back_one::<StableVec<usize>>(&mut group, n);
    }
    group.finish();
}

/// Benchmark: sum all elements front to back, then back to front.
fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_forward");
    for n in SIZES {
        forward_one::<Vec<usize>>(&mut group, n);
        forward_one::<StableVec<usize>>(&mut group, n);
    }
    group.finish();

    let mut group = c.benchmark_group("iterate_backward");
    for n in SIZES {
        backward_one::<Vec<usize>>(&mut group, n);
        backward_one::<StableVec<usize>>(&mut group, n);
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_populate,
    bench_destroy,
    bench_pop_back,
    bench_iterate
);
criterion_main!(benches);
