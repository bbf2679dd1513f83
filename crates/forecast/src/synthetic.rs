//! Synthetic in-memory datasets.
//!
//! Used by tests and by the viewer's offline mode. Fields are defined as
//! functions of `(step, lat, lon)` and evaluated only for the cells a slab
//! read asks for; every open and read is counted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use gfs_common::RunSelector;

use crate::clip::Window;
use crate::dataset::{DatasetSource, ForecastDataset, SlabSource};
use crate::error::{DatasetError, Result};
use crate::field::Axis;

/// Value generator for one variable: `(step, lat, lon) -> value`.
pub type FieldFn = Arc<dyn Fn(usize, f64, f64) -> f32 + Send + Sync>;

#[derive(Clone)]
struct SyntheticGrid {
    lats: Vec<f64>,
    lons: Vec<f64>,
    steps: usize,
    fields: HashMap<String, FieldFn>,
    fill_values: HashMap<String, f32>,
}

/// A dataset source producing synthetic GFS-like data.
#[derive(Clone)]
pub struct SyntheticSource {
    grid: Arc<SyntheticGrid>,
    opens: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    fail_open: bool,
}

/// Evenly spaced coordinates from `start`, inclusive of `end`.
pub fn coordinates(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step).abs().round() as usize + 1;
    let step = if end < start { -step.abs() } else { step.abs() };
    (0..count).map(|i| start + i as f64 * step).collect()
}

impl SyntheticSource {
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, steps: usize) -> Self {
        Self {
            grid: Arc::new(SyntheticGrid {
                lats,
                lons,
                steps,
                fields: HashMap::new(),
                fill_values: HashMap::new(),
            }),
            opens: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    fn grid_mut(&mut self) -> &mut SyntheticGrid {
        Arc::make_mut(&mut self.grid)
    }

    /// Add a variable from a generator function.
    pub fn with_field(
        mut self,
        name: &str,
        f: impl Fn(usize, f64, f64) -> f32 + Send + Sync + 'static,
    ) -> Self {
        self.grid_mut().fields.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Add a variable with the same value everywhere.
    pub fn with_constant(self, name: &str, value: f32) -> Self {
        self.with_field(name, move |_, _, _| value)
    }

    /// Declare a fill value for a variable.
    pub fn with_fill_value(mut self, name: &str, fill: f32) -> Self {
        self.grid_mut().fill_values.insert(name.to_string(), fill);
        self
    }

    /// Make every `open` fail as an unreachable server would.
    pub fn failing(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// A GFS-shaped dataset: 0.25° grid over `lat`/`lon` bounds, 241 hourly
    /// steps, and smooth fields for every variable the viewer reads.
    pub fn gfs_like(lat_range: (f64, f64), lon_range: (f64, f64)) -> Self {
        let lats = coordinates(lat_range.0, lat_range.1, 0.25);
        let lons = coordinates(lon_range.0, lon_range.1, 0.25);

        SyntheticSource::new(lats, lons, 241)
            // Rain bands drifting east, up to ~20 mm/hr
            .with_field("pratesfc", |step, lat, lon| {
                let phase = (lon - step as f64 * 0.5).to_radians() * 6.0;
                let band = (phase.sin() * (lat.to_radians() * 8.0).cos()).max(0.0);
                (band * band * 0.0055) as f32
            })
            // Warm tropics, cooling poleward and with a diurnal swing
            .with_field("tmp2m", |step, lat, _lon| {
                let diurnal = ((step % 24) as f64 / 24.0 * std::f64::consts::TAU).sin() * 3.0;
                (300.0 - lat.abs() * 0.6 + diurnal) as f32
            })
            // Trade-wind pattern: easterlies in the tropics
            .with_field("ugrd10m", |_step, lat, _lon| {
                (-8.0 * (lat.to_radians() * 3.0).cos()) as f32
            })
            .with_field("vgrd10m", |step, lat, lon| {
                (4.0 * ((lon + step as f64).to_radians() * 4.0).sin() * (lat.to_radians()).cos()) as f32
            })
            // Pressure highs and lows around 1010 hPa
            .with_field("prmslmsl", |step, lat, lon| {
                let wave = (lon.to_radians() * 5.0 + step as f64 * 0.05).sin()
                    * (lat.to_radians() * 4.0).cos();
                (101_000.0 + wave * 1_200.0 + lat.abs() * 20.0) as f32
            })
            // Scattered islands
            .with_field("landsfc", |_step, lat, lon| {
                let islands = (lat.to_radians() * 18.0).sin() * (lon.to_radians() * 14.0).cos();
                if islands > 0.55 {
                    1.0
                } else {
                    0.0
                }
            })
    }

    /// Number of times `open` was called.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of slab reads served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetSource for SyntheticSource {
    async fn open(&self, run: &RunSelector) -> Result<ForecastDataset> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let url = format!("synthetic://gfs{}/{}z", run.date_compact(), run.run_cycle);

        if self.fail_open {
            return Err(DatasetError::OpenFailed {
                url,
                source: opendap::OpendapError::Server("synthetic source is offline".to_string()),
            });
        }

        let lat = Axis::new(self.grid.lats.clone())
            .ok_or_else(|| DatasetError::invalid_metadata("latitude axis is not monotonic"))?;
        let lon = Axis::new(self.grid.lons.clone())
            .ok_or_else(|| DatasetError::invalid_metadata("longitude axis is not monotonic"))?;
        let init = run.init_time();
        let times = (0..self.grid.steps)
            .map(|h| init + Duration::hours(h as i64))
            .collect();

        let mut variables: Vec<String> = self.grid.fields.keys().cloned().collect();
        variables.sort();

        Ok(ForecastDataset::new(
            *run,
            url,
            times,
            lat,
            lon,
            variables,
            self.grid.fill_values.clone(),
            Arc::new(SyntheticSlabs {
                grid: Arc::clone(&self.grid),
                reads: Arc::clone(&self.reads),
            }),
        ))
    }
}

struct SyntheticSlabs {
    grid: Arc<SyntheticGrid>,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl SlabSource for SyntheticSlabs {
    async fn read_slab(&self, variable: &str, step: usize, window: &Window) -> Result<Vec<f32>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let f = self
            .grid
            .fields
            .get(variable)
            .ok_or_else(|| DatasetError::MissingVariable(variable.to_string()))?;

        let mut values = Vec::with_capacity(window.len());
        for &lat in &self.grid.lats[window.lat.clone()] {
            for &lon in &self.grid.lons[window.lon.clone()] {
                values.push(f(step, lat, lon));
            }
        }
        Ok(values)
    }
}
