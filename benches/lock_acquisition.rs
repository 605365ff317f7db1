//! Benchmarks for lock acquisition latency

use criterion::{Criterion, criterion_group, criterion_main};
use kv_lock_core::lock::{release, try_acquire};
use kv_lock_core::memory::InMemoryStore;
use kv_lock_core::prelude::*;
use kv_lock_core::provider::KvLockProvider;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_memory_lock_acquisition(c: &mut Criterion) {
    let rt = runtime();
    let store = Arc::new(InMemoryStore::with_active_table("bench"));
    let provider = rt
        .block_on(
            KvLockProvider::builder()
                .store(store.clone())
                .table_name("bench")
                .max_retries(0)
                .build(),
        )
        .unwrap();

    let lock = provider.create_lock("bench-lock");

    let mut group = c.benchmark_group("memory_lock");
    group.bench_function("try_acquire_release", |b| {
        b.to_async(runtime()).iter(|| async {
            if let Ok(Some(handle)) = lock.try_acquire().await {
                let _ = handle.release().await;
            }
        });
    });

    group.bench_function("acquire_no_wait", |b| {
        b.to_async(runtime()).iter(|| async {
            if let Ok(handle) = lock.acquire(Some(Duration::from_millis(1))).await {
                let _ = handle.release().await;
            }
        });
    });

    group.bench_function("contended_try_acquire", |b| {
        rt.block_on(try_acquire(store.as_ref(), "bench", "held")).unwrap();
        b.to_async(runtime()).iter(|| async {
            black_box(try_acquire(store.as_ref(), "bench", "held").await.is_err());
        });
        rt.block_on(release(store.as_ref(), "bench", "held")).unwrap();
    });

    group.finish();
}

criterion_group!(benches, bench_memory_lock_acquisition);
criterion_main!(benches);
