//! Request and pipeline stage metrics.
//!
//! Counters and histograms go to the `metrics` recorder (served as
//! Prometheus text on `/metrics`); per-stage timing summaries are also kept
//! in memory for the JSON snapshot on `/api/metrics`.

use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

/// Pipeline stage being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Resolve,
    Render,
    Encode,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Resolve => "resolve",
            Stage::Render => "render",
            Stage::Encode => "encode",
        }
    }
}

#[derive(Debug, Default, Clone)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn summary(&self) -> TimingSummary {
        let avg_ms = if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        };
        TimingSummary {
            count: self.count,
            avg_ms,
            min_ms: self.min_us as f64 / 1000.0,
            max_ms: self.max_us as f64 / 1000.0,
            last_ms: self.last_us as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingSummary {
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub page_requests: u64,
    pub map_requests: u64,
    pub maps_rendered: u64,
    pub map_errors: u64,
    pub load: TimingSummary,
    pub resolve: TimingSummary,
    pub render: TimingSummary,
    pub encode: TimingSummary,
}

#[derive(Default)]
struct StageTimes {
    load: TimingStats,
    resolve: TimingStats,
    render: TimingStats,
    encode: TimingStats,
}

impl StageTimes {
    fn get_mut(&mut self, stage: Stage) -> &mut TimingStats {
        match stage {
            Stage::Load => &mut self.load,
            Stage::Resolve => &mut self.resolve,
            Stage::Render => &mut self.render,
            Stage::Encode => &mut self.encode,
        }
    }
}

/// Service-wide metrics collector.
pub struct ViewerMetrics {
    page_requests: AtomicU64,
    map_requests: AtomicU64,
    maps_rendered: AtomicU64,
    map_errors: AtomicU64,
    stages: RwLock<StageTimes>,
    start_time: Instant,
}

impl Default for ViewerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerMetrics {
    pub fn new() -> Self {
        Self {
            page_requests: AtomicU64::new(0),
            map_requests: AtomicU64::new(0),
            maps_rendered: AtomicU64::new(0),
            map_errors: AtomicU64::new(0),
            stages: RwLock::new(StageTimes::default()),
            start_time: Instant::now(),
        }
    }

    pub fn record_page_request(&self) {
        self.page_requests.fetch_add(1, Ordering::Relaxed);
        counter!("viewer_page_requests_total").increment(1);
    }

    pub fn record_map_request(&self, parameter: &'static str) {
        self.map_requests.fetch_add(1, Ordering::Relaxed);
        counter!("viewer_map_requests_total", "parameter" => parameter).increment(1);
    }

    /// Record the outcome of a map request; `status` is the HTTP status sent.
    pub fn record_map_result(&self, duration_us: u64, status: u16) {
        if status < 400 {
            self.maps_rendered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.map_errors.fetch_add(1, Ordering::Relaxed);
            counter!("viewer_map_errors_total", "status" => status.to_string()).increment(1);
        }
        histogram!("viewer_map_request_duration_ms").record(duration_us as f64 / 1000.0);
    }

    pub async fn record_stage(&self, stage: Stage, duration_us: u64) {
        self.stages.write().await.get_mut(stage).record(duration_us);
        histogram!("viewer_stage_duration_ms", "stage" => stage.as_str()).record(duration_us as f64 / 1000.0);
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let stages = self.stages.read().await;
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            page_requests: self.page_requests.load(Ordering::Relaxed),
            map_requests: self.map_requests.load(Ordering::Relaxed),
            maps_rendered: self.maps_rendered.load(Ordering::Relaxed),
            map_errors: self.map_errors.load(Ordering::Relaxed),
            load: stages.load.summary(),
            resolve: stages.resolve.summary(),
            render: stages.render.summary(),
            encode: stages.encode.summary(),
        }
    }
}

/// Wall-clock timer in microseconds.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
