//! Opened forecast datasets and the traits behind them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gfs_common::RunSelector;
use tracing::debug;

use crate::clip::Window;
use crate::error::{DatasetError, Result};
use crate::field::{Axis, GridField};

/// Values at or above this magnitude are treated as missing even when the
/// dataset does not declare a fill value (GrADS uses 9.999e20).
const FILL_THRESHOLD: f32 = 9.0e20;

/// Reads hyperslabs of one variable at one time step.
#[async_trait]
pub trait SlabSource: Send + Sync {
    /// Read `variable[step][window.lat][window.lon]` as raw row-major values.
    async fn read_slab(&self, variable: &str, step: usize, window: &Window) -> Result<Vec<f32>>;
}

/// Opens a forecast dataset for a model run.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn open(&self, run: &RunSelector) -> Result<ForecastDataset>;
}

/// A read-only, remote-backed forecast dataset.
///
/// Coordinate axes and attributes are held in memory; field values are
/// fetched per slice through the slab source.
pub struct ForecastDataset {
    pub run: RunSelector,
    pub url: String,
    times: Vec<DateTime<Utc>>,
    lat: Axis,
    lon: Axis,
    variables: Vec<String>,
    fill_values: HashMap<String, f32>,
    source: Arc<dyn SlabSource>,
}

impl fmt::Debug for ForecastDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastDataset")
            .field("run", &self.run)
            .field("url", &self.url)
            .field("steps", &self.times.len())
            .field("lat", &self.lat.len())
            .field("lon", &self.lon.len())
            .field("variables", &self.variables)
            .finish()
    }
}

impl ForecastDataset {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run: RunSelector,
        url: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        lat: Axis,
        lon: Axis,
        variables: Vec<String>,
        fill_values: HashMap<String, f32>,
        source: Arc<dyn SlabSource>,
    ) -> Self {
        Self {
            run,
            url: url.into(),
            times,
            lat,
            lon,
            variables,
            fill_values,
            source,
        }
    }

    pub fn lat(&self) -> &Axis {
        &self.lat
    }

    pub fn lon(&self) -> &Axis {
        &self.lon
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }

    /// Check that `step` indexes the time axis.
    pub fn check_step(&self, step: u32) -> Result<usize> {
        let index = step as usize;
        if index >= self.times.len() {
            return Err(DatasetError::StepOutOfRange {
                step,
                available: self.times.len(),
            });
        }
        Ok(index)
    }

    /// Validity instant of a forecast step.
    pub fn valid_time(&self, step: u32) -> Result<DateTime<Utc>> {
        let index = self.check_step(step)?;
        Ok(self.times[index])
    }

    /// The window covering the whole grid.
    pub fn full_window(&self) -> Window {
        Window {
            lat: 0..self.lat.len(),
            lon: 0..self.lon.len(),
        }
    }

    /// Read one variable at one step over `window`, mapping fill values to `NaN`.
    pub async fn read_field(&self, variable: &str, step: u32, window: &Window) -> Result<GridField> {
        if !self.has_variable(variable) {
            return Err(DatasetError::MissingVariable(variable.to_string()));
        }
        let index = self.check_step(step)?;
        if window.lat.end > self.lat.len() || window.lon.end > self.lon.len() {
            return Err(DatasetError::read_failed(
                variable,
                format!("window {:?} exceeds grid {}x{}", window, self.lat.len(), self.lon.len()),
            ));
        }

        let mut data = self.source.read_slab(variable, index, window).await?;
        if data.len() != window.len() {
            return Err(DatasetError::read_failed(
                variable,
                format!("expected {} values, got {}", window.len(), data.len()),
            ));
        }

        let fill = self.fill_values.get(variable).copied();
        let mut missing = 0usize;
        for value in data.iter_mut() {
            let is_fill = fill.is_some_and(|f| *value == f) || value.abs() >= FILL_THRESHOLD;
            if is_fill || !value.is_finite() {
                *value = f32::NAN;
                missing += 1;
            }
        }
        debug!(variable, step, cells = data.len(), missing, "Read field");

        Ok(GridField::new(
            data,
            self.lat.values()[window.lat.clone()].to_vec(),
            self.lon.values()[window.lon.clone()].to_vec(),
        ))
    }
}
