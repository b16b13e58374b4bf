//! WAYBILL - Performance Benchmarks
//! Measures throughput of the version index, the WAL and the record layer using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use waybill::audit::AuditLog;
use waybill::config::Config;
use waybill::contract::{HistoryReconstructor, Order, RangeScanner, RecordStore, TxContext};
use waybill::ledger::index::VersionIndex;
use waybill::ledger::wal::WriteAheadLog;
use waybill::ledger::Journal;
use waybill::types::Version;

fn order(i: usize) -> Order {
    Order {
        order_no: format!("ordr_{:06}", i),
        date: "2024-03-01".to_string(),
        order_detail: format!("order details {}", i),
        invoice: format!("INV-{:06}", i),
        packing_status: "Packing".to_string(),
        payment_method: "Credit Card".to_string(),
        order_track: "In Progress".to_string(),
    }
}

fn bench_index_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_index");

    group.bench_function("append_1000", |b| {
        b.iter(|| {
            let mut index = VersionIndex::new();
            for i in 0..1000 {
                let key = format!("key_{:06}", i).into_bytes();
                let value = format!("value_{:06}", i).into_bytes();
                index.append(black_box(key), black_box(Version::put("tx", value)));
            }
        });
    });

    group.bench_function("live_range_1000", |b| {
        let mut index = VersionIndex::new();
        for i in 0..1000 {
            let key = format!("key_{:06}", i).into_bytes();
            index.append(key, Version::put("tx", b"value".to_vec()));
        }
        b.iter(|| {
            black_box(index.live_range(b"", b""));
        });
    });

    group.bench_function("history_100_versions", |b| {
        let mut index = VersionIndex::new();
        for i in 0..100 {
            index.append(b"key".to_vec(), Version::put(format!("tx{}", i), b"v".to_vec()));
        }
        b.iter(|| {
            black_box(index.history(b"key"));
        });
    });

    group.finish();
}

fn bench_wal_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal");

    group.bench_function("append_100", |b| {
        let dir = tempfile::tempdir().unwrap();
        let wal_path = dir.path().join("bench.wal");
        let mut wal = WriteAheadLog::open(wal_path, false).unwrap();

        b.iter(|| {
            for i in 0..100 {
                let key = format!("key_{:06}", i).into_bytes();
                let value = format!("value_{:06}", i).into_bytes();
                wal.append(black_box(&key), black_box(&Version::put("tx", value)))
                    .unwrap();
            }
        });
    });

    group.finish();
}

fn bench_record_e2e(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_e2e");
    let ctx = TxContext::new("tx-bench", "bench");

    for size in [100, 500].iter() {
        group.bench_with_input(
            BenchmarkId::new("create_read_cycle", size),
            size,
            |b, &size| {
                b.iter(|| {
                    let dir = tempfile::tempdir().unwrap();
                    let journal = Journal::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
                    let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

                    for i in 0..size {
                        let order = order(i);
                        store.create(&ctx, &order.order_no, &order).unwrap();
                    }

                    for i in 0..size {
                        let key = format!("ordr_{:06}", i);
                        black_box(store.read(&ctx, &key).unwrap());
                    }
                });
            },
        );
    }

    group.bench_function("enumerate_1000", |b| {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());
        for i in 0..1000 {
            let order = order(i);
            store.create(&ctx, &order.order_no, &order).unwrap();
        }
        let scanner: RangeScanner<_> = RangeScanner::new(&journal, AuditLog::default());

        b.iter(|| {
            black_box(scanner.collect_all(&ctx).unwrap());
        });
    });

    group.bench_function("history_50_updates", |b| {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());
        let mut current = order(0);
        store.create(&ctx, &current.order_no, &current).unwrap();
        for i in 0..50 {
            current.order_track = format!("hop {}", i);
            store.update(&ctx, &current.order_no, &current).unwrap();
        }
        let history: HistoryReconstructor<_> = HistoryReconstructor::new(&journal, AuditLog::default());

        b.iter(|| {
            black_box(history.collect_history(&ctx, "ordr_000000").unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_index_operations,
    bench_wal_operations,
    bench_record_e2e
);
criterion_main!(benches);
