use callgate::lifecycle::{ConnectionLifecycle, StreamLifecycle};
use callgate::network::{ConnectionEvents, StreamEvents};
use callgate::sync::WaitCell;
use criterion::{BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Setup notified from another thread until the waiter observes it.
pub fn bench_signal_to_wake(c: &mut Criterion) {
    c.bench_function("connection_setup_signal_to_wake", |b| {
        b.iter(|| {
            let lifecycle = Arc::new(ConnectionLifecycle::<u32>::new());
            let events: Arc<dyn ConnectionEvents<u32>> = lifecycle.clone();
            let notifier = thread::spawn(move || events.on_setup(Some(1), 0));
            let connection = lifecycle.await_setup(TIMEOUT).unwrap();
            notifier.join().unwrap();
            black_box(connection)
        })
    });
}

/// Cost of the per-chunk bookkeeping for a 1 MiB body at several chunk sizes.
pub fn bench_body_accumulation(c: &mut Criterion) {
    const BODY: usize = 1024 * 1024;
    let buf = vec![0x42u8; 64 * 1024];

    let mut group = c.benchmark_group("stream_body_accumulation");
    group.throughput(Throughput::Bytes(BODY as u64));
    for chunk in [512usize, 4096, 64 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let lifecycle = StreamLifecycle::new();
                for _ in 0..BODY / chunk {
                    lifecycle.on_response_body(&buf[..chunk]);
                }
                lifecycle.on_complete(0);
                black_box(lifecycle.await_complete(TIMEOUT).unwrap().body_size)
            })
        });
    }
    group.finish();
}

/// A wait whose deadline has already passed must return without sleeping.
pub fn bench_expired_wait(c: &mut Criterion) {
    let cell = WaitCell::new(false);
    c.bench_function("wait_cell_expired_deadline", |b| {
        b.iter(|| black_box(cell.wait_for(Duration::ZERO, |ready| *ready).is_err()))
    });
}
