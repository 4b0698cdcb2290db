//! Envelope computation over long buffers at UI-typical widths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fabula_audio::analysis::compute_envelope;
use fabula_audio::SampleBuffer;

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");

    // One minute of audio at 44.1 kHz
    let samples: Vec<f32> = (0..2_646_000)
        .map(|i| ((i % 1000) as f32 / 1000.0) - 0.5)
        .collect();
    let buffer = SampleBuffer::from_mono(samples, 44_100);

    for width in [100usize, 500, 2000] {
        group.bench_function(BenchmarkId::new("mono_60s", width), |b| {
            b.iter(|| black_box(compute_envelope(black_box(&buffer), width)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope);
criterion_main!(benches);
