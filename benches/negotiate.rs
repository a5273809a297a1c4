use std::hint::black_box;

use asset_swap::{
    circuit::SwapProgram,
    codec::{AssetCounts, Valuations},
    negotiate::negotiate,
};
use criterion::{BenchmarkId, Criterion, Throughput, measurement::Measurement};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::memory_tracking::MemoryMeasurement;

fn random_valuations(rng: &mut impl Rng, counts: AssetCounts) -> Valuations {
    let n = counts.total();
    let mut table = || -> Vec<i32> { (0..n).map(|_| rng.random_range(-1000..1000)).collect() };
    let party0 = table();
    let party1 = table();
    Valuations::new(counts, party0, party1).expect("tables match the counts")
}

fn bench_negotiate<M: Measurement>(
    c: &mut Criterion<M>,
    group: &str,
    sizes: &[usize],
    throughput: bool,
) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut g = c.benchmark_group(group);
    for &n in sizes {
        let counts = AssetCounts::new(n / 2, n - n / 2);
        let valuations = random_valuations(&mut rng, counts);
        if throughput {
            g.throughput(Throughput::Elements(1 << n));
        }
        g.bench_with_input(BenchmarkId::from_parameter(n), &valuations, |b, valuations| {
            b.iter(|| negotiate(black_box(valuations)))
        });
    }
    g.finish();
}

/// Wall time of the scan, which visits `2^n` candidates.
pub fn negotiate_benchmark(c: &mut Criterion) {
    bench_negotiate(c, "negotiate", &[8, 12, 16], true);
}

/// Peak heap allocation of the scan, which should not grow with the number of candidates.
pub fn negotiate_memory_benchmark(c: &mut Criterion<MemoryMeasurement>) {
    // throughput makes no sense for peak memory
    bench_negotiate(c, "negotiate memory", &[8, 16], false);
}

/// Compiling and evaluating the Garble program in the clear.
pub fn circuit_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let counts = AssetCounts::new(3, 3);
    let program = SwapProgram::render(counts).expect("6 assets can be rendered");

    let mut g = c.benchmark_group("circuit");
    g.bench_function("compile 6 assets", |b| {
        b.iter(|| black_box(&program).compile().expect("program compiles"))
    });
    let compiled = program.compile().expect("program compiles");
    let valuations = random_valuations(&mut rng, counts);
    g.bench_function("evaluate 6 assets", |b| {
        b.iter(|| compiled.evaluate(black_box(&valuations)).expect("evaluation succeeds"))
    });
    g.finish();
}
