use criterion::{black_box, criterion_group, criterion_main, Criterion};
use math_board::board::model::{Color, Point};
use math_board::board::surface::RasterSurface;

fn sketched_surface() -> RasterSurface {
    let mut surface = RasterSurface::new(1920, 1080);
    let white = Color::rgba(255, 255, 255, 255);
    for row in 0..6 {
        let y = 300.0 + row as f32 * 80.0;
        surface.begin_stroke(Point::new(600.0, y), white);
        surface.extend_stroke(Point::new(900.0, y + 40.0));
        surface.extend_stroke(Point::new(1200.0, y));
    }
    surface
}

fn bench_bounding_box(c: &mut Criterion) {
    let surface = sketched_surface();
    c.bench_function("bounds_1080p", |b| {
        b.iter(|| black_box(&surface).non_background_bounds())
    });

    let blank = RasterSurface::new(1920, 1080);
    c.bench_function("bounds_1080p_blank", |b| {
        b.iter(|| black_box(&blank).non_background_bounds())
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let surface = sketched_surface();
    c.bench_function("snapshot_1080p", |b| {
        b.iter(|| black_box(&surface).export_snapshot())
    });
}

criterion_group!(benches, bench_bounding_box, bench_snapshot);
criterion_main!(benches);
