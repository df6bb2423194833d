//! Criterion benchmarks for Fock-index generation.

use codeword::{fock_indices_for_all_codewords, Codeword};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn alternating_codeword(size: usize, alpha: f64) -> Codeword {
    let word = (0..size).map(|i| if i % 2 == 0 { alpha } else { -alpha }).collect();
    Codeword::new(word, alpha).expect("valid codeword")
}

fn fock_indices_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("fock_indices");

    for (size, cutoff) in [(1, 10), (2, 10), (4, 6), (6, 6)] {
        let codeword = alternating_codeword(size, 0.7);
        let param = format!("n{size}_d{cutoff}");

        group.bench_with_input(BenchmarkId::new("all_codewords", &param), &cutoff, |bencher, &cutoff| {
            bencher.iter(|| fock_indices_for_all_codewords(&codeword, cutoff).expect("cutoff covers size"));
        });
    }
    group.finish();
}

criterion_group!(benches, fock_indices_benchmark);
criterion_main!(benches);
