//! Store insert throughput benchmarks.
//!
//! Run with: cargo bench --bench store_insert

use cctop::model::EventKind;
use cctop::store::insert::insert_event;
use cctop::store::Store;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

fn benchmark_insert_create_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_create_events");

    for count in [100usize, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let db_path = dir.path().join("bench.db");
                let mut store = Store::open(&db_path).unwrap();

                for i in 0..count {
                    black_box(
                        insert_event(
                            store.connection_mut(),
                            i as u64,
                            EventKind::Create,
                            1_000 + i as i64,
                            &format!("/bench/file_{i}.txt"),
                            &format!("file_{i}.txt"),
                            "/bench",
                            None,
                        )
                        .unwrap(),
                    );
                }
            })
        });
    }

    group.finish();
}

fn benchmark_insert_same_file_modifies(c: &mut Criterion) {
    c.bench_function("insert_1000_modifies_same_file", |b| {
        b.iter(|| {
            let dir = TempDir::new().unwrap();
            let db_path = dir.path().join("bench.db");
            let mut store = Store::open(&db_path).unwrap();

            for i in 0..1_000 {
                black_box(
                    insert_event(
                        store.connection_mut(),
                        1,
                        EventKind::Modify,
                        1_000 + i,
                        "/bench/hot.txt",
                        "hot.txt",
                        "/bench",
                        None,
                    )
                    .unwrap(),
                );
            }
        })
    });
}

criterion_group!(benches, benchmark_insert_create_events, benchmark_insert_same_file_modifies);
criterion_main!(benches);
