//! Benchmarks for map rendering and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use forecast::{DisplayField, GridField, VectorComponents};
use gfs_common::{Deployment, Parameter};
use renderer::contour::{evenly_spaced_levels, march_squares};
use renderer::{encode_png, MapRenderer};

/// Whole-Indonesia grid at 0.25°: 121 × 241 cells.
fn indonesia_grid(f: impl Fn(f64, f64) -> f32) -> GridField {
    let lats: Vec<f64> = (0..121).map(|i| 15.0 - i as f64 * 0.25).collect();
    let lons: Vec<f64> = (0..241).map(|i| 90.0 + i as f64 * 0.25).collect();
    let mut data = Vec::with_capacity(lats.len() * lons.len());
    for &lat in &lats {
        for &lon in &lons {
            data.push(f(lat, lon));
        }
    }
    GridField::new(data, lats, lons)
}

fn temperature(lat: f64, lon: f64) -> f32 {
    (27.0 - lat.abs() * 0.3 + (lon.to_radians() * 8.0).sin() * 3.0) as f32
}

fn pressure(lat: f64, lon: f64) -> f32 {
    (1008.0 + (lat.to_radians() * 6.0).cos() * 6.0 + (lon.to_radians() * 5.0).sin() * 4.0) as f32
}

fn display(parameter: Parameter, field: GridField, range: (f32, f32)) -> DisplayField {
    DisplayField {
        parameter,
        field,
        label: parameter.display_label().to_string(),
        colormap: parameter.colormap().to_string(),
        value_range: range,
        draw_mode: parameter.draw_mode(),
        vectors: None,
    }
}

fn bench_render_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_map");
    let renderer = MapRenderer::with_assets(Deployment::indonesia(), None, None);
    let valid = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap();

    let land = indonesia_grid(|lat, lon| if (lat.to_radians() * 18.0).sin() * (lon.to_radians() * 14.0).cos() > 0.5 { 1.0 } else { 0.0 });

    let filled = display(Parameter::Temperature, indonesia_grid(temperature), (20.0, 35.0));
    let contour = display(Parameter::Pressure, indonesia_grid(pressure), (980.0, 1020.0));
    let mut wind = display(Parameter::Wind, indonesia_grid(|_, _| 15.0), (0.0, 40.0));
    wind.vectors = Some(VectorComponents {
        u: indonesia_grid(|lat, _| (-8.0 * (lat.to_radians() * 3.0).cos()) as f32),
        v: indonesia_grid(|_, lon| (4.0 * (lon.to_radians() * 4.0).sin()) as f32),
    });

    for (name, field) in [("filled", &filled), ("contour", &contour), ("filled_vector", &wind)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), field, |b, field| {
            b.iter(|| renderer.render(black_box(field), Some(&land), &valid, 7))
        });
    }
    group.finish();
}

fn bench_march_squares(c: &mut Criterion) {
    let field = indonesia_grid(pressure);
    let (lo, hi) = field.min_max().unwrap_or((1000.0, 1016.0));
    let levels = evenly_spaced_levels(lo, hi, 15);

    c.bench_function("march_squares_15_levels", |b| {
        b.iter(|| {
            levels
                .iter()
                .map(|&level| march_squares(black_box(&field.data), field.width(), field.height(), level).len())
                .sum::<usize>()
        })
    });
}

fn bench_png_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encoding");
    let renderer = MapRenderer::with_assets(Deployment::indonesia(), None, None);
    let valid = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap();

    let filled = display(Parameter::Temperature, indonesia_grid(temperature), (20.0, 35.0));
    if let Ok(map) = renderer.render(&filled, None, &valid, 0) {
        let pixels = (map.width() * map.height()) as u64;
        group.throughput(Throughput::Elements(pixels));
        group.bench_function("indonesia_1000x600", |b| b.iter(|| encode_png(black_box(&map.image))));
    }
    group.finish();
}

criterion_group!(benches, bench_render_modes, bench_march_squares, bench_png_encoding);
criterion_main!(benches);
