use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use traceplot::core::scale::{Scale, ScaleConfig};
use traceplot::render::{Font, RecordingSurface};

fn bench_value_round_trip(c: &mut Criterion) {
    let mut scale = Scale::horizontal();
    scale.set_bounds(0.0, 10_000.0);
    scale.set_size_px(1920.0).expect("valid size");

    c.bench_function("scale_value_round_trip", |b| {
        b.iter(|| {
            let px = scale.value_to_pos(black_box(4_321.123));
            let _ = scale.pos_to_value(black_box(px));
        })
    });
}

fn bench_numeric_label_generation(c: &mut Criterion) {
    let measure = RecordingSurface::new();
    let font = Font::default();
    let mut scale = Scale::horizontal();
    scale.set_size_px(1920.0).expect("valid size");

    c.bench_function("numeric_label_generation", |b| {
        b.iter(|| {
            scale
                .generate_labels(black_box(1_234.5), black_box(-56.7), &measure, &font)
                .expect("labels should generate");
        })
    });
}

fn bench_time_label_generation(c: &mut Criterion) {
    let measure = RecordingSurface::new();
    let font = Font::default();
    let mut scale = Scale::new(ScaleConfig {
        time_domain: true,
        ..ScaleConfig::default()
    });
    scale.set_size_px(1280.0).expect("valid size");

    // A two-day window in unix seconds.
    let min = 1_700_000_000.0;
    let max = min + 172_800.0;

    c.bench_function("time_label_generation", |b| {
        b.iter(|| {
            scale
                .generate_labels(black_box(max), black_box(min), &measure, &font)
                .expect("labels should generate");
        })
    });
}

criterion_group!(
    benches,
    bench_value_round_trip,
    bench_numeric_label_generation,
    bench_time_label_generation
);
criterion_main!(benches);
