//! Micro-benchmarks for the shared-region primitives

use criterion::{Criterion, criterion_group, criterion_main};
use shm_sync::{PushResult, RingBuffer, SharedRegion, SpinLock};
use std::hint::black_box;
use std::thread;

/// Uncontended lock/unlock round trip
fn bench_spinlock_uncontended(c: &mut Criterion) {
    let region = SharedRegion::new(1).unwrap();
    let lock = SpinLock::new(&region, 0).unwrap();

    c.bench_function("spinlock_uncontended", |b| {
        b.iter(|| {
            lock.lock();
            black_box(());
            lock.unlock();
        });
    });
}

/// CAS increment without contention
fn bench_cas_increment(c: &mut Criterion) {
    let region = SharedRegion::new(1).unwrap();
    let view = region.view(0).unwrap();

    c.bench_function("cas_increment", |b| {
        b.iter(|| {
            let current = view.load();
            black_box(view.compare_exchange(current, current.wrapping_add(1)));
        });
    });
}

/// SPSC throughput with a dedicated consumer thread
fn bench_spsc_throughput(c: &mut Criterion) {
    const BATCH: u32 = 10_000;

    c.bench_function("spsc_push_pop_10k", |b| {
        b.iter(|| {
            let region = SharedRegion::new(66).unwrap();
            let ring = RingBuffer::new(&region, 0, 1, 2, 64).unwrap();

            thread::scope(|s| {
                s.spawn(|| {
                    for v in 0..BATCH {
                        while ring.push(v) == PushResult::Full {
                            std::hint::spin_loop();
                        }
                    }
                });

                let mut received = 0;
                while received < BATCH {
                    if let Some(v) = ring.pop() {
                        black_box(v);
                        received += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_spinlock_uncontended,
    bench_cas_increment,
    bench_spsc_throughput
);
criterion_main!(benches);
