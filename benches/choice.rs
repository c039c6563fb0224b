use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use parametrize::discretization::Encoder;
use parametrize::prelude::*;

/// Build a choice over `arity` integer constants.
fn int_choice(arity: i64, repetitions: usize) -> Choice {
    Choice::builder(0..arity)
        .repetitions(repetitions)
        .build()
        .unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let mut rng = fastrand::Rng::with_seed(42);

    for arity in [4_usize, 32, 256] {
        let weights: Vec<f64> = (0..arity * 8).map(|_| rng.f64() * 4.0 - 2.0).collect();
        group.bench_with_input(BenchmarkId::new("arity", arity), &weights, |b, weights| {
            let encoder = Encoder::new(weights, arity).unwrap();
            b.iter(|| encoder.encode(&mut rng, false));
        });
    }
    group.finish();
}

fn bench_choice_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("choice_mutate");
    let mut rng = fastrand::Rng::with_seed(42);

    for arity in [4_i64, 32, 256] {
        let mut choice = int_choice(arity, 4);
        group.bench_function(BenchmarkId::new("arity", arity), |b| {
            b.iter(|| {
                choice.mutate(&mut rng).unwrap();
                choice.value(&mut rng)
            });
        });
    }
    group.finish();
}

fn bench_transition_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_mutate");
    let mut rng = fastrand::Rng::with_seed(42);

    for arity in [4_i64, 32, 256] {
        let mut choice = TransitionChoice::new(0..arity).unwrap();
        group.bench_function(BenchmarkId::new("arity", arity), |b| {
            b.iter(|| {
                choice.mutate(&mut rng).unwrap();
                choice.index()
            });
        });
    }
    group.finish();
}

fn bench_set_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_value");

    for arity in [4_i64, 32, 256] {
        let mut choice = int_choice(arity, 1);
        // the matching candidate is the last one tried
        let target = Value::Tuple(vec![Value::Int(arity - 1)]);
        group.bench_function(BenchmarkId::new("arity", arity), |b| {
            b.iter(|| choice.set_value(&target).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_choice_mutate,
    bench_transition_mutate,
    bench_set_value
);
criterion_main!(benches);
