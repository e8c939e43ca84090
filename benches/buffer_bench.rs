// benches/buffer_bench.rs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use recyclemem::prelude::*;
use std::hint::black_box;
use std::io::{Seek, SeekFrom, Write};

fn manager() -> std::sync::Arc<MemoryStreamManager> {
    MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap()
}

fn bench_stream_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_write_read");
    let mgr = manager();

    for size in [256usize, 4096, 16384, 32768].iter() {
        let data = vec![0x42u8; *size];
        group.bench_with_input(BenchmarkId::new("write_read", size), size, |b, _| {
            b.iter(|| {
                let mut stream = mgr.get_stream("bench", 0, false);
                stream.write_all(black_box(&data)).unwrap();
                stream.seek(SeekFrom::Start(0)).unwrap();
                let mut out = vec![0u8; data.len()];
                std::io::Read::read_exact(&mut stream, &mut out).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_pooled_vs_unpooled_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pooled_vs_unpooled_blocks");
    let mgr = manager();

    group.bench_function("pooled_block_round_trip", |b| {
        b.iter(|| {
            let block = mgr.get_block("bench");
            black_box(&block);
            mgr.return_blocks(vec![block], "bench").unwrap();
        });
    });

    group.bench_function("unpooled_vec_alloc", |b| {
        b.iter(|| {
            let block: Vec<u8> = vec![0u8; 16384];
            black_box(block);
        });
    });

    group.finish();
}

fn bench_large_buffer_pool_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_buffer_pool");
    let mgr = manager();

    for size in [1_048_576usize, 2_097_152, 4_194_304].iter() {
        group.bench_with_input(BenchmarkId::new("get_return", size), size, |b, &size| {
            b.iter(|| {
                let buf = mgr.get_large_buffer(black_box(size), "bench");
                mgr.return_large_buffer(buf, "bench").unwrap();
            });
        });
    }

    group.finish();
}

fn bench_promotion_to_large_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("promotion");
    let mgr = manager();

    group.bench_function("write_past_one_block_then_get_buffer", |b| {
        let data = vec![0x7Au8; 20_000];
        b.iter(|| {
            let mut stream = mgr.get_stream("bench", 0, false);
            stream.write_all(black_box(&data)).unwrap();
            let _ = stream.get_buffer().unwrap();
        });
    });

    group.finish();
}

fn bench_concurrent_pool_contention(c: &mut Criterion) {
    use std::sync::Arc;
    use std::thread;

    let mut group = c.benchmark_group("pool_contention");
    group.bench_function("four_threads_get_return_blocks", |b| {
        let mgr = manager();
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let mgr = Arc::clone(&mgr);
                    thread::spawn(move || {
                        for _ in 0..50 {
                            let block = mgr.get_block("bench");
                            mgr.return_blocks(vec![block], "bench").unwrap();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_stream_write_read,
    bench_pooled_vs_unpooled_blocks,
    bench_large_buffer_pool_round_trip,
    bench_promotion_to_large_buffer,
    bench_concurrent_pool_contention,
);

criterion_main!(benches);
