//! Parameter resolution: source fields to a unit-converted display field.

use gfs_common::{Parameter, ValueRanges};
use tracing::{debug, instrument};

use crate::clip::Window;
use crate::dataset::ForecastDataset;
use crate::error::{DatasetError, Result};
use crate::field::{DisplayField, GridField, VectorComponents};

/// Seconds per hour; precipitation rate kg m⁻² s⁻¹ to mm/hr.
pub const SECONDS_PER_HOUR: f32 = 3600.0;
/// Kelvin offset of the Celsius scale.
pub const KELVIN_OFFSET: f32 = 273.15;
/// Knots per metre per second.
pub const KNOTS_PER_MS: f32 = 1.94384;
/// Pascals per hectopascal.
pub const PA_PER_HPA: f32 = 100.0;

pub fn rain_rate_to_mm_per_hr(rate: f32) -> f32 {
    rate * SECONDS_PER_HOUR
}

pub fn kelvin_to_celsius(kelvin: f32) -> f32 {
    kelvin - KELVIN_OFFSET
}

/// Wind speed in knots from components in m/s.
pub fn wind_speed_knots(u: f32, v: f32) -> f32 {
    u.hypot(v) * KNOTS_PER_MS
}

pub fn pa_to_hpa(pa: f32) -> f32 {
    pa / PA_PER_HPA
}

/// Resolve `parameter` at `step` over the whole grid.
pub async fn resolve(
    dataset: &ForecastDataset,
    parameter: Parameter,
    step: u32,
    ranges: &ValueRanges,
) -> Result<DisplayField> {
    resolve_window(dataset, parameter, step, &dataset.full_window(), ranges).await
}

/// Resolve `parameter` at `step`, reading only the cells in `window`.
#[instrument(skip(dataset, window, ranges), fields(run = %dataset.run))]
pub async fn resolve_window(
    dataset: &ForecastDataset,
    parameter: Parameter,
    step: u32,
    window: &Window,
    ranges: &ValueRanges,
) -> Result<DisplayField> {
    dataset.check_step(step)?;

    let (field, vectors) = match parameter {
        Parameter::Rainfall => {
            let rate = dataset.read_field("pratesfc", step, window).await?;
            (rate.map(rain_rate_to_mm_per_hr), None)
        }
        Parameter::Temperature => {
            let kelvin = dataset.read_field("tmp2m", step, window).await?;
            (kelvin.map(kelvin_to_celsius), None)
        }
        Parameter::Wind => {
            let u = dataset.read_field("ugrd10m", step, window).await?;
            let v = dataset.read_field("vgrd10m", step, window).await?;
            let speed = wind_speed(&u, &v)?;
            (speed, Some(VectorComponents { u, v }))
        }
        Parameter::Pressure => {
            let pa = dataset.read_field("prmslmsl", step, window).await?;
            (pa.map(pa_to_hpa), None)
        }
    };

    debug!(
        parameter = %parameter,
        rows = field.height(),
        cols = field.width(),
        range = ?field.min_max(),
        "Resolved display field"
    );

    Ok(DisplayField {
        parameter,
        field,
        label: parameter.display_label().to_string(),
        colormap: parameter.colormap().to_string(),
        value_range: ranges.for_parameter(parameter),
        draw_mode: parameter.draw_mode(),
        vectors,
    })
}

fn wind_speed(u: &GridField, v: &GridField) -> Result<GridField> {
    if u.lats != v.lats || u.lons != v.lons {
        return Err(DatasetError::read_failed(
            "vgrd10m",
            "wind components are on different grids",
        ));
    }
    let data = u
        .data
        .iter()
        .zip(&v.data)
        .map(|(&u, &v)| wind_speed_knots(u, v))
        .collect();
    Ok(GridField::new(data, u.lats.clone(), u.lons.clone()))
}
