//! Repository operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use freightdb_bench::{load_fields, populated_loads, random_id};
use freightdb_core::{builtin, FieldMap, RecordRepository};

/// Benchmark creates against indexes of growing size.
fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    for existing in [0usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, &existing| {
                let repo = populated_loads(existing);
                let fields = load_fields();

                b.iter(|| {
                    let record = repo.create(&random_id(), black_box(&fields)).unwrap();
                    black_box(record);
                });
            },
        );
    }
    group.finish();
}

/// Benchmark point reads.
fn bench_read(c: &mut Criterion) {
    let repo = populated_loads(1000);

    c.bench_function("read", |b| {
        b.iter(|| {
            let bytes = repo.read(black_box("L000500")).unwrap();
            black_box(bytes);
        });
    });

    c.bench_function("read_missing", |b| {
        b.iter(|| {
            let result = repo.read(black_box("missing"));
            black_box(result.is_err());
        });
    });
}

/// Benchmark single-field updates.
fn bench_update(c: &mut Criterion) {
    let repo = populated_loads(100);
    let mut patch = FieldMap::new();

    c.bench_function("update_status", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            patch.insert("status".into(), format!("stop-{n}"));
            let record = repo.update("L000050", black_box(&patch)).unwrap();
            black_box(record);
        });
    });
}

/// Benchmark create-then-delete churn.
fn bench_churn(c: &mut Criterion) {
    let repo = populated_loads(500);
    let fields = load_fields();

    c.bench_function("create_delete", |b| {
        b.iter(|| {
            let id = random_id();
            repo.create(&id, &fields).unwrap();
            black_box(repo.delete(&id).unwrap());
        });
    });
}

/// Benchmark full listings.
fn bench_list_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_all");
    group.sample_size(50);

    for count in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let repo = populated_loads(count);
            b.iter(|| {
                let listing = repo.list_all().unwrap();
                black_box(listing);
            });
        });
    }
    group.finish();
}

/// Benchmark contract creation, which has no locked fields.
fn bench_contract_create(c: &mut Criterion) {
    let repo = RecordRepository::open_in_memory(builtin::contract()).unwrap();
    repo.initialize().unwrap();
    let fields: FieldMap = [("carrier", "ACME"), ("origin", "Memphis"), ("destination", "Dallas")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    c.bench_function("contract_create", |b| {
        b.iter(|| {
            let record = repo.create(&random_id(), black_box(&fields)).unwrap();
            black_box(record);
        });
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_read,
    bench_update,
    bench_churn,
    bench_list_all,
    bench_contract_create,
);

criterion_main!(benches);
