use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hearkit::{embed_audio, frame_audio, load_model, EmbeddingModel};
use ndarray::Array2;

fn make_sine_batch(freq_hz: f64, recordings: usize, n_samples: usize, sample_rate: f64) -> Array2<f32> {
    Array2::from_shape_fn((recordings, n_samples), |(_, i)| {
        let t = i as f64 / sample_rate;
        (0.5 * (freq_hz * 2.0 * std::f64::consts::PI * t).sin()) as f32
    })
}

fn bench_frame_1s(c: &mut Criterion) {
    let audio = make_sine_batch(440.0, 4, 44100, 44100.0);

    c.bench_function("hearkit_frame_4x1s_hop100ms", |b| {
        b.iter(|| {
            let _ = black_box(frame_audio(black_box(audio.view()), 4096, 0.1, 44100));
        });
    });
}

fn bench_embed_frames(c: &mut Criterion) {
    let model = load_model("", "cpu").unwrap();
    let frames = make_sine_batch(440.0, 32, model.frame_size(), 44100.0);

    c.bench_function("hearkit_embed_32_frames", |b| {
        b.iter(|| {
            let _ = black_box(model.embed(black_box(frames.view())));
        });
    });
}

fn bench_embed_audio_1s(c: &mut Criterion) {
    let model = load_model("", "cpu").unwrap();
    let audio = make_sine_batch(440.0, 1, 44100, 44100.0);

    c.bench_function("hearkit_embed_audio_1s_hop50ms", |b| {
        b.iter(|| {
            let _ = black_box(embed_audio(black_box(audio.view().into_dyn()), &model, 0.05, 512));
        });
    });
}

criterion_group!(benches, bench_frame_1s, bench_embed_frames, bench_embed_audio_1s);
criterion_main!(benches);
