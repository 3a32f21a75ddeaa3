use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rc522::crypto1::{prng, Crypto1, ParityData};
use rc522::MifareKey;

fn bench_transcrypt(c: &mut Criterion) {
    let key = MifareKey::DEFAULT;
    let mut group = c.benchmark_group("transcrypt");
    for &size in &[4usize, 16usize, 18usize, 64usize] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut cipher = Crypto1::reader(&key);
                cipher.mutual_1(black_box(0xB479_F7D7), black_box(0xF3FB_AEED));
                let mut buf: Vec<ParityData> = (0..size)
                    .map(|i| ParityData::with_odd_parity(i as u8))
                    .collect();
                cipher.transcrypt(&mut buf);
                black_box(buf)
            });
        });
    }
    group.finish();
}

fn bench_mutual_auth(c: &mut Criterion) {
    let key = MifareKey::DEFAULT;
    c.bench_function("mutual_auth_reader", |b| {
        b.iter(|| {
            let mut reader = Crypto1::reader(&key);
            reader.mutual_1(black_box(0xB479_F7D7), black_box(0xF3FB_AEED));
            let mut response = [ParityData::default(); 8];
            response[..4].copy_from_slice(&rc522::crypto1::word_to_parity(0x07C9_A995));
            reader.mutual_2(&mut response);
            black_box(response)
        });
    });
}

fn bench_prng_successor(c: &mut Criterion) {
    let mut group = c.benchmark_group("prng_successor");
    for &steps in &[16u32, 64u32, 96u32] {
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, &steps| {
            b.iter(|| black_box(prng::successor(black_box(0xF3FB_AEED), steps)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_transcrypt,
    bench_mutual_auth,
    bench_prng_successor
);
criterion_main!(benches);
