//! Loader caching, parameter resolution and clipping against synthetic datasets.

use chrono::{NaiveDate, TimeZone, Utc};
use forecast::synthetic::coordinates;
use forecast::{
    clip, clip_display, resolve, resolve_window, window_for, DatasetCache, DatasetError,
    DatasetSource, SyntheticSource,
};
use gfs_common::{DrawMode, Parameter, Region, RunCycle, RunSelector, ValueRanges};

fn run(day: u32, cycle: RunCycle) -> RunSelector {
    RunSelector::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), cycle)
}

/// Small ascending grid with constant fields.
fn constant_source() -> SyntheticSource {
    SyntheticSource::new(coordinates(-2.0, 2.0, 1.0), coordinates(100.0, 104.0, 1.0), 25)
        .with_constant("pratesfc", 1.0)
        .with_constant("tmp2m", 300.0)
        .with_constant("ugrd10m", 3.0)
        .with_constant("vgrd10m", -4.0)
        .with_constant("prmslmsl", 101_325.0)
}

// ============================================================================
// Parameter resolution
// ============================================================================

#[tokio::test]
async fn test_rainfall_rate_resolves_to_mm_per_hour() {
    let dataset = constant_source().open(&run(15, RunCycle::Z00)).await.unwrap();
    let field = resolve(&dataset, Parameter::Rainfall, 0, &ValueRanges::default())
        .await
        .unwrap();

    assert!(field.field.data.iter().all(|&v| v == 3600.0));
    assert_eq!(field.label, "Rainfall (mm/hr)");
    assert_eq!(field.colormap, "Blues");
    assert_eq!(field.value_range, (0.0, 50.0));
    assert_eq!(field.draw_mode, DrawMode::Filled);
    assert!(field.vectors.is_none());
}

#[tokio::test]
async fn test_temperature_resolves_to_celsius() {
    let dataset = constant_source().open(&run(15, RunCycle::Z00)).await.unwrap();
    let field = resolve(&dataset, Parameter::Temperature, 3, &ValueRanges::default())
        .await
        .unwrap();

    assert!(field.field.data.iter().all(|&v| (v - 26.85).abs() < 1e-4));
    assert_eq!(field.label, "Temperature (°C)");
    assert_eq!(field.colormap, "coolwarm");
}

#[tokio::test]
async fn test_wind_resolves_to_knots_with_components() {
    let dataset = constant_source().open(&run(15, RunCycle::Z00)).await.unwrap();
    let field = resolve(&dataset, Parameter::Wind, 1, &ValueRanges::default())
        .await
        .unwrap();

    assert!(field.field.data.iter().all(|&v| (v - 5.0 * 1.94384).abs() < 1e-4));
    assert_eq!(field.draw_mode, DrawMode::FilledVector);
    let vectors = field.vectors.expect("wind keeps u/v");
    assert!(vectors.u.data.iter().all(|&u| u == 3.0));
    assert!(vectors.v.data.iter().all(|&v| v == -4.0));
}

#[tokio::test]
async fn test_calm_wind_is_zero() {
    let source = constant_source()
        .with_constant("ugrd10m", 0.0)
        .with_constant("vgrd10m", 0.0);
    let dataset = source.open(&run(15, RunCycle::Z00)).await.unwrap();
    let field = resolve(&dataset, Parameter::Wind, 0, &ValueRanges::default())
        .await
        .unwrap();
    assert!(field.field.data.iter().all(|&v| v == 0.0));
}

#[tokio::test]
async fn test_pressure_resolves_to_hpa_contours() {
    let dataset = constant_source().open(&run(15, RunCycle::Z00)).await.unwrap();
    let field = resolve(&dataset, Parameter::Pressure, 0, &ValueRanges::default())
        .await
        .unwrap();

    assert!(field.field.data.iter().all(|&v| (v - 1013.25).abs() < 1e-3));
    assert_eq!(field.label, "MSLP (hPa)");
    assert_eq!(field.draw_mode, DrawMode::Contour);
}

#[tokio::test]
async fn test_fill_values_become_nan() {
    let source = constant_source()
        .with_field("tmp2m", |_, lat, _| if lat > 1.5 { 9.999e20 } else { 300.0 })
        .with_fill_value("tmp2m", 9.999e20);
    let dataset = source.open(&run(15, RunCycle::Z00)).await.unwrap();
    let field = resolve(&dataset, Parameter::Temperature, 0, &ValueRanges::default())
        .await
        .unwrap();

    let nan_count = field.field.data.iter().filter(|v| v.is_nan()).count();
    assert_eq!(nan_count, 5); // the lat = 2 row
}

#[tokio::test]
async fn test_step_beyond_time_axis_is_out_of_range() {
    let dataset = constant_source().open(&run(15, RunCycle::Z00)).await.unwrap();
    let err = resolve(&dataset, Parameter::Rainfall, 25, &ValueRanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::StepOutOfRange { step: 25, available: 25 }));
}

#[tokio::test]
async fn test_unrecognized_parameter_reads_no_fields() {
    let source = constant_source();
    let cache = DatasetCache::new(source.clone());
    let _dataset = cache.load(&run(15, RunCycle::Z00)).await.unwrap();

    assert!(Parameter::from_selector("foobar").is_err());
    assert_eq!(source.read_count(), 0);
}

#[tokio::test]
async fn test_valid_time_follows_time_axis() {
    let dataset = constant_source().open(&run(15, RunCycle::Z06)).await.unwrap();
    assert_eq!(
        dataset.valid_time(7).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap()
    );
}

// ============================================================================
// Dataset cache
// ============================================================================

#[tokio::test]
async fn test_identical_run_is_fetched_once() {
    let source = constant_source();
    let cache = DatasetCache::new(source.clone());

    for cycle in RunCycle::all() {
        let selector = run(15, *cycle);
        let first = cache.load(&selector).await.unwrap();
        let opens = source.open_count();
        let second = cache.load(&selector).await.unwrap();

        assert_eq!(source.open_count(), opens);
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }
    assert_eq!(source.open_count(), 4);
    assert_eq!(cache.stats().hits, 4);
}

#[tokio::test]
async fn test_different_run_replaces_entry() {
    let source = constant_source();
    let cache = DatasetCache::new(source.clone());

    cache.load(&run(15, RunCycle::Z00)).await.unwrap();
    cache.load(&run(16, RunCycle::Z00)).await.unwrap();
    cache.load(&run(15, RunCycle::Z00)).await.unwrap();

    assert_eq!(source.open_count(), 3);
    assert_eq!(cache.cached_run().await, Some(run(15, RunCycle::Z00)));
    assert_eq!(cache.stats().replacements, 2);
}

#[tokio::test]
async fn test_load_failure_is_not_cached() {
    let source = constant_source().failing();
    let cache = DatasetCache::new(source.clone());

    assert!(cache.load(&run(15, RunCycle::Z00)).await.is_err());
    assert!(cache.load(&run(15, RunCycle::Z00)).await.is_err());
    assert_eq!(source.open_count(), 2);
    assert_eq!(cache.cached_run().await, None);
}

#[test]
fn test_cache_load_from_blocking_context() {
    let source = constant_source();
    let cache = DatasetCache::new(source.clone());
    let dataset = tokio_test::block_on(cache.load(&run(15, RunCycle::Z12))).unwrap();
    assert_eq!(dataset.times().len(), 25);
}

// ============================================================================
// Clipping
// ============================================================================

fn latitude_source(lats: Vec<f64>) -> SyntheticSource {
    SyntheticSource::new(lats, coordinates(100.0, 120.0, 0.25), 3)
        .with_field("tmp2m", |_, lat, lon| (273.15 + lat + lon / 100.0) as f32)
}

#[tokio::test]
async fn test_clip_matches_for_ascending_and_descending_latitudes() {
    let region = Region::new(-9.0, -6.5, 110.8, 114.8);
    let mut results = Vec::new();

    for lats in [coordinates(-15.0, 15.0, 0.25), coordinates(15.0, -15.0, 0.25)] {
        let dataset = latitude_source(lats).open(&run(15, RunCycle::Z00)).await.unwrap();
        let window = window_for(dataset.lat(), dataset.lon(), &region).unwrap();
        let field = resolve_window(&dataset, Parameter::Temperature, 0, &window, &ValueRanges::default())
            .await
            .unwrap();

        assert!(!field.field.is_empty());
        assert!(field.field.lats.iter().all(|&l| (-9.0..=-6.5).contains(&l)));
        assert!(field.field.lons.iter().all(|&l| (110.8..=114.8).contains(&l)));

        let mut values = field.field.data.clone();
        values.sort_by(|a, b| a.total_cmp(b));
        results.push((field.field.height(), field.field.width(), values));
    }

    assert_eq!(results[0], results[1]);
}

#[tokio::test]
async fn test_clip_before_fetch_equals_clip_after() {
    let region = Region::new(-5.0, 5.0, 105.0, 110.0);
    let dataset = latitude_source(coordinates(10.0, -10.0, 0.25))
        .open(&run(15, RunCycle::Z00))
        .await
        .unwrap();

    let full = resolve(&dataset, Parameter::Temperature, 0, &ValueRanges::default())
        .await
        .unwrap();
    let after = clip_display(&full, &region).unwrap();

    let window = window_for(dataset.lat(), dataset.lon(), &region).unwrap();
    let before = resolve_window(&dataset, Parameter::Temperature, 0, &window, &ValueRanges::default())
        .await
        .unwrap();

    assert_eq!(after.field, before.field);
    assert_eq!(clip(&full.field, &region).unwrap(), before.field);
}

#[tokio::test]
async fn test_wind_components_are_clipped_identically() {
    let source = SyntheticSource::new(coordinates(-3.0, 3.0, 0.5), coordinates(100.0, 106.0, 0.5), 2)
        .with_field("ugrd10m", |_, lat, _| lat as f32)
        .with_field("vgrd10m", |_, _, lon| lon as f32);
    let dataset = source.open(&run(15, RunCycle::Z00)).await.unwrap();
    let full = resolve(&dataset, Parameter::Wind, 0, &ValueRanges::default())
        .await
        .unwrap();

    let clipped = clip_display(&full, &Region::new(-1.0, 1.0, 101.0, 102.0)).unwrap();
    let vectors = clipped.vectors.unwrap();
    assert_eq!(vectors.u.lats, clipped.field.lats);
    assert_eq!(vectors.v.lons, clipped.field.lons);
    assert_eq!(vectors.u.data.len(), clipped.field.data.len());
}

#[tokio::test]
async fn test_region_outside_grid_is_empty() {
    let dataset = latitude_source(coordinates(-15.0, 15.0, 0.25))
        .open(&run(15, RunCycle::Z00))
        .await
        .unwrap();
    let err = window_for(dataset.lat(), dataset.lon(), &Region::new(30.0, 40.0, 100.0, 110.0))
        .unwrap_err();
    assert!(matches!(err, DatasetError::EmptyRegion(_)));
}
