use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rc522::picc::crc_a;

fn bench_crc_a(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc_a");
    for &size in &[2usize, 7usize, 16usize, 64usize] {
        let payload: Vec<u8> = (0..size).map(|i| (i & 0xFF) as u8).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, p| {
            b.iter(|| black_box(crc_a(black_box(p))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crc_a);
criterion_main!(benches);
