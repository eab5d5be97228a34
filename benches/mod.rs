use criterion::{criterion_group, criterion_main};

mod lifecycle;

criterion_group!(
    benches,
    lifecycle::bench_signal_to_wake,
    lifecycle::bench_body_accumulation,
    lifecycle::bench_expired_wait
);
criterion_main!(benches);
