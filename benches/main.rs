use criterion::{black_box, criterion_group, criterion_main, Criterion};
use score_follower::decoder;
use score_follower::{ByteOrder, MpmEstimator, PitchEstimator, PositionTracker, SampleFormat, SampleType, Score};

fn run_tracker_benchmark(id: &str, c: &mut Criterion, score_length: usize) {
    let score = Score::new((0..score_length).map(|i| 40 + i % 48).collect()).unwrap();
    let mut tracker = PositionTracker::new(score);
    let mut note = 40;
    c.bench_function(id, |b| {
        b.iter(|| {
            note = 40 + (note + 7) % 48;
            tracker.update(black_box(note))
        })
    });
}

fn tracker_benchmarks(c: &mut Criterion) {
    run_tracker_benchmark("Score 100", c, 100);
    run_tracker_benchmark("Score 1000", c, 1000);
    run_tracker_benchmark("Score 10000", c, 10000);
}

fn run_decoder_benchmark(id: &str, c: &mut Criterion, format: SampleFormat) {
    let sample_count = 4096;
    let bytes = vec![0x5a_u8; sample_count * format.bytes_per_sample()];
    let mut samples = Vec::with_capacity(sample_count);
    c.bench_function(id, |b| {
        b.iter(|| {
            samples.clear();
            decoder::decode_into(black_box(&bytes[..]), sample_count, format, &mut samples)
        })
    });
}

fn decoder_benchmarks(c: &mut Criterion) {
    run_decoder_benchmark(
        "Decode 4096, 16 bit LE",
        c,
        SampleFormat::new(16, SampleType::SignedInt, ByteOrder::LittleEndian),
    );
    run_decoder_benchmark(
        "Decode 4096, 32 bit float BE",
        c,
        SampleFormat::new(32, SampleType::Float, ByteOrder::BigEndian),
    );
}

fn run_estimator_benchmark(id: &str, c: &mut Criterion, frame_size: usize) {
    let mut estimator = MpmEstimator::new(44100.0, frame_size).unwrap();
    let frame: Vec<f32> = (0..frame_size)
        .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
        .collect();
    c.bench_function(id, |b| b.iter(|| estimator.estimate(black_box(&frame[..]))));
}

fn estimator_benchmarks(c: &mut Criterion) {
    run_estimator_benchmark("MPM frame 512", c, 512);
    run_estimator_benchmark("MPM frame 1024", c, 1024);
    run_estimator_benchmark("MPM frame 2048", c, 2048);
}

criterion_group!(benches, tracker_benchmarks, decoder_benchmarks, estimator_benchmarks);
criterion_main!(benches);
