//! Benchmarks for fault counting
//!
//! Run with: cargo bench -p qfault-count

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qfault_count::convolve::convolve_counts;
use qfault_count::{Component, KGood, RuntimeContext, RuntimeFlags};
use qfault_ir::{Code, ErrorType, NoiseModels};

fn no_cache(ctx: RuntimeContext) -> RuntimeContext {
    let flags = RuntimeFlags {
        memoize: false,
        ..ctx.flags()
    };
    ctx.with_flags(flags)
}

/// Benchmark counting a transversal CNOT at growing fault orders
fn bench_trans_cnot(c: &mut Criterion) {
    let mut group = c.benchmark_group("trans_cnot");
    let noise = NoiseModels::depolarizing();
    let code = Arc::new(Code::ed422(None));

    for k in &[1usize, 2, 3] {
        let cnot = Component::trans_cnot(KGood::uniform(*k), code.clone(), code.clone()).unwrap();
        let ctx = no_cache(RuntimeContext::sequential());
        group.bench_with_input(BenchmarkId::new("ed422", k), &cnot, |b, cnot| {
            b.iter(|| cnot.count(&ctx, &noise, black_box(ErrorType::Y), None, None).unwrap());
        });
    }

    group.finish();
}

/// Benchmark sequential composition with and without the worker pool
fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    let noise = NoiseModels::depolarizing();
    let code = Arc::new(Code::golay());
    let rest = Component::trans_rest(KGood::uniform(2), code, "q");
    let gadget = Component::sequential(KGood::uniform(2), vec![rest.clone(), rest.clone(), rest]).unwrap();

    let contexts = [
        ("single_thread", no_cache(RuntimeContext::sequential())),
        ("pool_4", no_cache(RuntimeContext::with_workers(4).unwrap())),
    ];
    for (name, ctx) in &contexts {
        group.bench_function(*name, |b| {
            b.iter(|| gadget.count(ctx, &noise, black_box(ErrorType::Y), None, None).unwrap());
        });
    }

    group.finish();
}

/// Benchmark raw convolution of counted tables
fn bench_convolve(c: &mut Criterion) {
    let ctx = RuntimeContext::sequential();
    let noise = NoiseModels::depolarizing();
    let code = Arc::new(Code::golay());
    let counts = Component::trans_rest(KGood::uniform(2), code, "q")
        .count(&ctx, &noise, ErrorType::Y, None, None)
        .unwrap()
        .counts;

    c.bench_function("convolve_golay_rest", |b| {
        b.iter(|| convolve_counts(&ctx, black_box(&counts), black_box(&counts), Some(2)).unwrap());
    });
}

criterion_group!(benches, bench_trans_cnot, bench_sequential, bench_convolve);
criterion_main!(benches);
