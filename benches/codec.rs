//! Benchmarks for ctxlz compression and decompression throughput.
//!
//! Covers several data patterns, the quality ladder and window sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ctxlz::{compress, decompress, Decoder, EncoderMode};

/// Generate random (incompressible) data
fn generate_random_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for _ in 0..size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.push((state & 0xFF) as u8);
    }
    data
}

/// Generate repetitive (highly compressible) data
fn generate_repetitive_data(size: usize) -> Vec<u8> {
    b"ABCDABCDABCDABCD".iter().cycle().take(size).copied().collect()
}

/// Generate log-like text with a small vocabulary
fn generate_text_data(size: usize) -> Vec<u8> {
    let words = ["GET", "POST", "/index.html", "/api/v1/items", "200", "404", "user", "session", "ok"];
    let mut data = Vec::with_capacity(size + 32);
    let mut state = 12345u32;
    let mut line = 0u32;
    while data.len() < size {
        data.extend_from_slice(format!("{:08} ", line).as_bytes());
        for _ in 0..6 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            data.extend_from_slice(words[(state >> 16) as usize % words.len()].as_bytes());
            data.push(b' ');
        }
        data.push(b'\n');
        line += 1;
    }
    data.truncate(size);
    data
}

fn bench_data_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_patterns");
    let size = 256 * 1024;

    let patterns = [
        ("random", generate_random_data(size)),
        ("repetitive", generate_repetitive_data(size)),
        ("text", generate_text_data(size)),
    ];

    group.throughput(Throughput::Bytes(size as u64));
    for (name, data) in &patterns {
        group.bench_with_input(BenchmarkId::new("compress", name), data, |b, data| {
            b.iter(|| compress(5, 22, EncoderMode::Generic, data).unwrap());
        });

        let compressed = compress(5, 22, EncoderMode::Generic, data).unwrap();
        group.bench_with_input(BenchmarkId::new("decompress", name), &compressed, |b, compressed| {
            b.iter(|| decompress(compressed, size));
        });
    }

    group.finish();
}

fn bench_quality_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("quality_levels");
    let size = 256 * 1024;
    let data = generate_text_data(size);

    group.throughput(Throughput::Bytes(size as u64));
    for quality in [0, 1, 4, 6, 9, 10, 11] {
        group.bench_with_input(BenchmarkId::new("compress", quality), &data, |b, data| {
            b.iter(|| compress(quality, 22, EncoderMode::Text, data).unwrap());
        });
    }

    group.finish();
}

fn bench_window_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_sizes");
    let size = 1024 * 1024;
    let data = generate_text_data(size);

    group.throughput(Throughput::Bytes(size as u64));
    for window_bits in [10, 16, 22, 24] {
        group.bench_with_input(BenchmarkId::new("compress", window_bits), &data, |b, data| {
            b.iter(|| compress(6, window_bits, EncoderMode::Text, data).unwrap());
        });
    }

    group.finish();
}

fn bench_streaming_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_decode");
    let size = 1024 * 1024;
    let data = generate_text_data(size);
    let compressed = compress(9, 22, EncoderMode::Text, &data).unwrap();

    group.throughput(Throughput::Bytes(size as u64));
    for chunk in [4096, 65_536] {
        group.bench_with_input(BenchmarkId::new("input_chunk", chunk), &compressed, |b, compressed| {
            b.iter(|| {
                let mut decoder = Decoder::new();
                let mut output = Vec::with_capacity(size);
                let mut end = 0;
                while !decoder.is_finished() && end < compressed.len() {
                    end = (end + chunk).min(compressed.len());
                    decoder.decode(&compressed[..end], &mut output, size);
                }
                output
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_data_patterns, bench_quality_levels, bench_window_sizes, bench_streaming_decode,);
criterion_main!(benches);
