use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use preserve_ref::{Config, PreserveReference, Value};
use std::time::Duration;

fn payload(width: usize, tag: &str) -> Value {
    Value::object((0..width).map(|i| {
        (
            format!("k{i:04}"),
            Value::array([Value::from(i as i64), Value::from(tag)]),
        )
    }))
}

fn bench_same_reference(c: &mut Criterion) {
    c.bench_function("preserve_same_reference", |b| {
        let mut p = PreserveReference::new(Config::production());
        let v = payload(256, "a");
        p.apply(v.clone()).unwrap();
        b.iter(|| black_box(p.apply(v.clone()).unwrap()))
    });
}

fn bench_equal_content(c: &mut Criterion) {
    c.bench_function("preserve_equal_content", |b| {
        let mut p = PreserveReference::new(Config::production());
        p.apply(payload(256, "a")).unwrap();
        b.iter_batched(
            || payload(256, "a"),
            |v| black_box(p.apply(v).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

fn bench_changed_content(c: &mut Criterion) {
    c.bench_function("preserve_changed_content", |b| {
        let mut p = PreserveReference::new(Config::production());
        let mut flip = false;
        b.iter_batched(
            || {
                flip = !flip;
                payload(256, if flip { "a" } else { "b" })
            },
            |v| black_box(p.apply(v).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_same_reference, bench_equal_content, bench_changed_content
}
criterion_main!(benches);
