use criterion::{black_box, criterion_group, criterion_main, Criterion};
use urania::dms::{format_degrees, FormatFlags};
use urania::json::escape;

fn bench_format_zodiac(c: &mut Criterion) {
    c.bench_function("format_degrees_zodiac", |b| {
        b.iter(|| format_degrees(black_box(263.123_456), black_box(FormatFlags::ZODIAC)))
    });
}

fn bench_format_circle(c: &mut Criterion) {
    let flags = FormatFlags::ROUND_SEC;
    c.bench_function("format_degrees_full_circle", |b| {
        b.iter(|| {
            for i in 0..360 {
                black_box(format_degrees(black_box(i as f64 + 0.5), flags));
            }
        })
    });
}

fn bench_escape(c: &mut Criterion) {
    let text = "SwissEph file 'seas_18.se1' not found in PATH \"eph\"\n".repeat(4);
    c.bench_function("escape_error_message", |b| b.iter(|| escape(black_box(&text))));
}

criterion_group!(benches, bench_format_zodiac, bench_format_circle, bench_escape);
criterion_main!(benches);
