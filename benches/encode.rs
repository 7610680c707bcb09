extern crate criterion;
extern crate rastergif;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rastergif::{encode_to_vec, PixelBuffer, PixelFormat, Rgb};

fn colormap() -> Vec<Rgb> {
    (0..=255u8).map(|i| [i, i.wrapping_mul(3), 255 - i]).collect()
}

pub fn criterion_benchmark(c: &mut Criterion, name: &str, data: Vec<u8>) {
    const SIDE: usize = 512;
    assert_eq!(data.len(), SIDE * SIDE);
    let colormap = colormap();

    let mut group = c.benchmark_group("indexed-512");
    let id = BenchmarkId::new(name, data.len());
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(id, &data, |b, data| {
        b.iter(|| {
            let pixels = PixelBuffer::new(data, SIDE, SIDE, PixelFormat::Indexed {
                colormap: &colormap,
            });
            black_box(encode_to_vec(&pixels).expect("Error"));
        })
    });
}

pub fn bench_flat(c: &mut Criterion) {
    criterion_benchmark(c, "flat", vec![7; 512 * 512]);
}

pub fn bench_stripes(c: &mut Criterion) {
    let data = (0..512 * 512).map(|i| ((i / 512) % 16) as u8).collect();
    criterion_benchmark(c, "stripes", data);
}

pub fn bench_noise(c: &mut Criterion) {
    let mut state = 0x2545_f491u32;
    let data = (0..512 * 512)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect();
    criterion_benchmark(c, "noise", data);
}

criterion_group!(benches, bench_flat, bench_stripes, bench_noise);
criterion_main!(benches);
