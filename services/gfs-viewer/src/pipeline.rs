//! The map pipeline: load, clip, resolve, render, encode.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use forecast::{resolve_window, window_for, ForecastDataset, GridField, Window};
use gfs_common::{Parameter, RunCycle, RunSelector, ViewerError, ViewerResult, MAX_FORECAST_STEP};
use tracing::{info, instrument, warn};

use crate::metrics::{Stage, Timer};
use crate::state::AppState;

/// Dataset variable holding the land fraction.
pub const LAND_MASK_VARIABLE: &str = "landsfc";

/// A validated map request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRequest {
    pub run: RunSelector,
    pub step: u32,
    pub parameter: Parameter,
}

impl MapRequest {
    pub fn new(run_date: NaiveDate, run_cycle: RunCycle, step: u32, parameter: Parameter) -> ViewerResult<Self> {
        if step > MAX_FORECAST_STEP {
            return Err(ViewerError::StepOutOfRange {
                step,
                max: MAX_FORECAST_STEP,
            });
        }
        Ok(Self {
            run: RunSelector::new(run_date, run_cycle),
            step,
            parameter,
        })
    }

    /// Validate raw form values.
    ///
    /// `parameter` is matched by substring, so both the full selector text
    /// and the bare key (`"tmp2m"`) are accepted.
    pub fn parse(date: &str, cycle: &str, step: &str, parameter: &str) -> ViewerResult<Self> {
        let run_date = RunSelector::parse_date(date)?;
        let run_cycle: RunCycle = cycle.parse()?;
        let step: u32 = step
            .trim()
            .parse()
            .map_err(|_| ViewerError::invalid("step", format!("'{}' is not a whole number of hours", step)))?;
        let parameter = Parameter::from_selector(parameter)?;
        Self::new(run_date, run_cycle, step, parameter)
    }

    pub fn download_name(&self) -> String {
        renderer::download_name(self.parameter, self.step)
    }

    /// Query string for `/map.png` that reproduces this request.
    pub fn query_string(&self) -> String {
        format!(
            "date={}&cycle={}&step={}&parameter={}",
            self.run.run_date.format("%Y-%m-%d"),
            self.run.run_cycle,
            self.step,
            self.parameter.key()
        )
    }
}

/// Encoded output of one pipeline run.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub png: Vec<u8>,
    pub file_name: String,
    pub valid_time: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
}

/// Load the run and check that `request` can be drawn from it, without
/// rendering. Returns the valid time of the requested step.
///
/// Loading goes through the dataset cache, so a following `render_map` for
/// the same run does not reopen it.
pub async fn check_map(state: &AppState, request: &MapRequest) -> ViewerResult<DateTime<Utc>> {
    let dataset = state.cache.load(&request.run).await?;
    window_for(dataset.lat(), dataset.lon(), &state.deployment().region)?;
    for variable in request.parameter.source_fields() {
        if !dataset.has_variable(variable) {
            return Err(ViewerError::FieldReadFailed {
                field: variable.to_string(),
                message: "not present in dataset".to_string(),
            });
        }
    }
    Ok(dataset.valid_time(request.step)?)
}

/// Run the full pipeline for `request`.
///
/// Every failure aborts the request; nothing is retried.
#[instrument(skip(state), fields(run = %request.run, parameter = %request.parameter, step = request.step))]
pub async fn render_map(state: &AppState, request: &MapRequest) -> ViewerResult<RenderedMap> {
    let timer = Timer::start();
    let dataset = state.cache.load(&request.run).await?;
    state.metrics.record_stage(Stage::Load, timer.elapsed_us()).await;

    let deployment = state.deployment();
    let timer = Timer::start();
    let window = window_for(dataset.lat(), dataset.lon(), &deployment.region)?;
    let field = resolve_window(&dataset, request.parameter, request.step, &window, &deployment.ranges).await?;
    let land_mask = if deployment.land_mask {
        read_land_mask(&dataset, request.step, &window).await
    } else {
        None
    };
    let valid_time = dataset.valid_time(request.step)?;
    state.metrics.record_stage(Stage::Resolve, timer.elapsed_us()).await;

    let renderer = Arc::clone(&state.renderer);
    let step = request.step;
    let (image, png, render_us, encode_us) = tokio::task::spawn_blocking(move || -> renderer::Result<_> {
        let timer = Timer::start();
        let image = renderer.render(&field, land_mask.as_ref(), &valid_time, step)?;
        let render_us = timer.elapsed_us();

        let timer = Timer::start();
        let png = image.to_png()?;
        Ok((image, png, render_us, timer.elapsed_us()))
    })
    .await
    .map_err(|e| ViewerError::RenderFailed(format!("render task failed: {}", e)))??;

    state.metrics.record_stage(Stage::Render, render_us).await;
    state.metrics.record_stage(Stage::Encode, encode_us).await;

    info!(
        valid = %valid_time,
        width = image.width(),
        height = image.height(),
        bytes = png.len(),
        "Map rendered"
    );

    Ok(RenderedMap {
        png,
        file_name: image.download_name(),
        valid_time,
        width: image.width(),
        height: image.height(),
    })
}

/// The clipped land mask, or `None` when the dataset lacks one or it cannot
/// be read. The map is still drawn without land fill in that case.
async fn read_land_mask(dataset: &ForecastDataset, step: u32, window: &Window) -> Option<GridField> {
    if !dataset.has_variable(LAND_MASK_VARIABLE) {
        return None;
    }
    match dataset.read_field(LAND_MASK_VARIABLE, step, window).await {
        Ok(mask) => Some(mask),
        Err(e) => {
            warn!(error = %e, "Land mask unavailable, drawing without land fill");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_values() {
        let request = MapRequest::parse("2024-01-15", "06", "7", "Surface Temperature (tmp2m)").unwrap();
        assert_eq!(request.run.date_compact(), "20240115");
        assert_eq!(request.run.run_cycle, RunCycle::Z06);
        assert_eq!(request.step, 7);
        assert_eq!(request.parameter, Parameter::Temperature);
        assert_eq!(request.download_name(), "tmp2m_t+007.png");
        assert_eq!(request.query_string(), "date=2024-01-15&cycle=06&step=7&parameter=tmp2m");
    }

    #[test]
    fn test_query_string_round_trips() {
        let request = MapRequest::parse("20240115", "18z", "240", "Mean Sea Level Pressure (prmslmsl)").unwrap();
        assert_eq!(request.query_string(), "date=2024-01-15&cycle=18&step=240&parameter=prmsl");
        let again = MapRequest::parse("2024-01-15", "18", "240", "prmsl").unwrap();
        assert_eq!(again, request);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            MapRequest::parse("15/01/2024", "06", "0", "tmp2m"),
            Err(ViewerError::InvalidRequest { .. })
        ));
        assert!(matches!(
            MapRequest::parse("2024-01-15", "03", "0", "tmp2m"),
            Err(ViewerError::InvalidRequest { .. })
        ));
        assert!(matches!(
            MapRequest::parse("2024-01-15", "06", "-1", "tmp2m"),
            Err(ViewerError::InvalidRequest { .. })
        ));
        assert!(matches!(
            MapRequest::parse("2024-01-15", "06", "241", "tmp2m"),
            Err(ViewerError::StepOutOfRange { step: 241, max: 240 })
        ));
        assert!(matches!(
            MapRequest::parse("2024-01-15", "06", "0", "humidity"),
            Err(ViewerError::UnrecognizedParameter(_))
        ));
    }
}
