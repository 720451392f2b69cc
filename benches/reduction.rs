use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use it2_type_reduction::{Accelerated, Algorithm, Backend, Interval, Reference};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// A sampled centroid-style output: one point interval per domain sample
fn sampled_output(n: usize) -> Vec<Interval> {
    let mut rng = StdRng::seed_from_u64(n as u64);

    (0..n)
        .map(|i| {
            let x = i as f64 * 10. / n as f64;
            let upper = rng.random_range(0.05..=1.0);

            Interval::point(x, upper * rng.random_range(0.0..=1.0), upper)
        })
        .collect()
}

fn benchmark_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("algorithms");
    let intervals = sampled_output(500);
    let weights = vec![1.; intervals.len()];

    for algorithm in Algorithm::ALL {
        let params: &[f64] = match algorithm {
            Algorithm::Wekm => &weights,
            Algorithm::Bmm | Algorithm::Lbmm => &[0.5, 0.5],
            _ => &[],
        };

        group.bench_function(algorithm.name(), |b| {
            b.iter(|| black_box(algorithm.call(black_box(&intervals), params)))
        });
    }

    group.finish();
}

fn benchmark_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("backends");
    let backends: [&dyn Backend; 2] = [&Reference, &Accelerated];

    for n in [100, 500, 2000] {
        let intervals = sampled_output(n);

        for algorithm in [Algorithm::Km, Algorithm::Ekm, Algorithm::Eiasc, Algorithm::Wm] {
            for backend in backends {
                group.bench_with_input(
                    BenchmarkId::new(format!("{algorithm}/{}", backend.name()), n),
                    &intervals,
                    |b, intervals| b.iter(|| black_box(backend.reduce(algorithm, intervals, &[]))),
                );
            }
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_algorithms, benchmark_backends);
criterion_main!(benches);
