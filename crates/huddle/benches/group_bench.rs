use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use huddle::{fingerprint, group_records, FingerprintTrie, PipelineConfig};
use std::io::Cursor;

fn generate_records(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                "Record number {} talks about topic {} with enough text to look like a short post\n",
                i,
                i % 10
            )
        })
        .collect()
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    let short = b"The quick brown fox jumps over the lazy dog";
    let long = generate_records(1);

    group.throughput(Throughput::Bytes(short.len() as u64));
    group.bench_function("short_record", |b| {
        b.iter(|| fingerprint(black_box(short)))
    });

    group.throughput(Throughput::Bytes(long.len() as u64));
    group.bench_function("typical_record", |b| {
        b.iter(|| fingerprint(black_box(long.as_bytes())))
    });

    group.finish();
}

fn bench_trie(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie");

    let codes: Vec<_> = (0..1000)
        .map(|i: u64| fingerprint(format!("record body number {i}").as_bytes()))
        .collect();

    group.bench_function("insert_1000", |b| {
        b.iter(|| {
            let mut trie = FingerprintTrie::new();
            for (i, code) in codes.iter().enumerate() {
                trie.insert(black_box(code), i as u64);
            }
            trie
        })
    });

    let mut trie = FingerprintTrie::new();
    for (i, code) in codes.iter().enumerate() {
        trie.insert(code, i as u64);
    }
    let query = fingerprint(b"record body number 500");

    group.bench_function("find_neighbors_d0", |b| {
        b.iter(|| trie.find_neighbors(black_box(&query), 0))
    });
    group.bench_function("find_neighbors_d5", |b| {
        b.iter(|| trie.find_neighbors(black_box(&query), 5))
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let input = generate_records(1000);
    group.throughput(Throughput::Elements(1000));

    for workers in [1, 4] {
        group.bench_function(format!("group_1000_w{workers}"), |b| {
            b.iter(|| {
                let config = PipelineConfig::default().with_deviance(5).with_workers(workers);
                group_records(Cursor::new(input.as_bytes().to_vec()), config).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_trie, bench_pipeline);
criterion_main!(benches);
