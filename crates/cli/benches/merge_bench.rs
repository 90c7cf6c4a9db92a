use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dataset::StreamDataset;
use record::Record;
use sources::{SourceAdapter, UniformSource};

const N_INPUTS: usize = 8;
const N_RECORDS: i32 = 20_000;

fn build_inputs() -> Vec<StreamDataset> {
    (0..N_INPUTS)
        .map(|i| {
            UniformSource::new(16, 4, 1000, N_RECORDS, i as u64)
                .load()
                .unwrap()
        })
        .collect()
}

fn merge_records_benchmark(c: &mut Criterion) {
    let inputs = build_inputs();
    let slices: Vec<&[Record]> = inputs.iter().map(|ds| ds.records()).collect();

    c.bench_function("merge_records_8x20k", |b| {
        b.iter(|| black_box(merge::merge_records(&slices)));
    });
}

fn concat_sort_benchmark(c: &mut Criterion) {
    let inputs = build_inputs();

    c.bench_function("concat_stable_sort_8x20k", |b| {
        b.iter(|| {
            let mut all: Vec<Record> = inputs.iter().flat_map(|ds| ds.iter().copied()).collect();
            all.sort_by_key(|r| r.timestamp);
            black_box(all)
        });
    });
}

fn time_window_benchmark(c: &mut Criterion) {
    let base = UniformSource::new(16, 4, 1000, N_RECORDS, 1).load().unwrap();

    c.bench_function("time_window_20k", |b| {
        b.iter_batched(
            || base.clone(),
            |mut ds| {
                ds.time_window(500).unwrap();
                ds
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    merge_records_benchmark,
    concat_sort_benchmark,
    time_window_benchmark
);
criterion_main!(benches);
