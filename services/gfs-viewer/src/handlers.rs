//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use chrono::Utc;
use gfs_common::{ViewerError, ViewerResult};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::metrics::Timer;
use crate::page::{render_page, FormValues, Outcome};
use crate::pipeline::{check_map, render_map, MapRequest};
use crate::state::AppState;

/// Query parameters shared by the form page and the map endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    pub date: Option<String>,
    pub cycle: Option<String>,
    pub step: Option<String>,
    pub parameter: Option<String>,
    pub download: Option<String>,
}

impl MapParams {
    /// Whether any selection was submitted.
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.cycle.is_none() && self.step.is_none() && self.parameter.is_none()
    }

    /// Submitted values over the form defaults.
    pub fn form_values(&self) -> FormValues {
        let defaults = FormValues::defaults(Utc::now().date_naive());
        FormValues {
            date: self.date.clone().unwrap_or(defaults.date),
            cycle: self.cycle.clone().unwrap_or(defaults.cycle),
            step: self.step.clone().unwrap_or(defaults.step),
            parameter: self.parameter.clone().unwrap_or(defaults.parameter),
        }
    }

    /// Validate into a map request. `parameter` has no default.
    pub fn to_request(&self) -> ViewerResult<MapRequest> {
        if self.parameter.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(ViewerError::invalid("parameter", "is required"));
        }
        let values = self.form_values();
        MapRequest::parse(&values.date, &values.cycle, &values.step, &values.parameter)
    }

    pub fn wants_download(&self) -> bool {
        matches!(self.download.as_deref(), Some("1" | "true" | "yes"))
    }
}

/// Plain-text error response with the mapped status code.
pub fn error_response(err: &ViewerError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], err.to_string()).into_response()
}

/// `GET /`: the input form, plus the selected map once submitted.
pub async fn index_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Html<String> {
    state.metrics.record_page_request();

    let values = params.form_values();
    let outcome = if params.is_empty() {
        Outcome::Empty
    } else {
        let checked = match params.to_request() {
            Ok(request) => check_map(&state, &request).await.map(|_| request),
            Err(e) => Err(e),
        };
        match checked {
            Ok(request) => Outcome::Map(request),
            Err(e) => {
                warn!(error = %e, "Form selection cannot be drawn");
                Outcome::Error(e)
            }
        }
    };
    Html(render_page(state.deployment(), &values, &outcome))
}

/// `GET /map.png`: run the pipeline and return the PNG.
pub async fn map_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Response {
    let timer = Timer::start();

    let request = match params.to_request() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected map request");
            state.metrics.record_map_result(timer.elapsed_us(), e.http_status_code());
            return error_response(&e);
        }
    };
    state.metrics.record_map_request(request.parameter.key());
    info!(run = %request.run, parameter = %request.parameter, step = request.step, "Map request");

    match render_map(&state, &request).await {
        Ok(map) => {
            state.metrics.record_map_result(timer.elapsed_us(), StatusCode::OK.as_u16());
            let mut response = (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], map.png).into_response();
            if params.wants_download() {
                let disposition = format!("attachment; filename=\"{}\"", map.file_name);
                if let Ok(value) = HeaderValue::from_str(&disposition) {
                    response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
                }
            }
            response
        }
        Err(e) => {
            let status = e.http_status_code();
            state.metrics.record_map_result(timer.elapsed_us(), status);
            if e.is_warning() {
                warn!(error = %e, "Map request failed");
            } else {
                error!(error = %e, status = status, "Map request failed");
            }
            error_response(&e)
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Prometheus text exposition.
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}

/// JSON metrics snapshot.
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.metrics.snapshot().await;
    let cache = state.cache.stats();
    Json(serde_json::json!({
        "deployment": state.deployment().name,
        "requests": snapshot,
        "dataset_cache": {
            "hits": cache.hits,
            "misses": cache.misses,
            "replacements": cache.replacements,
            "hit_rate": cache.hit_rate(),
            "cached_run": state.cache.cached_run().await.map(|r| r.to_string()),
        },
    }))
}
