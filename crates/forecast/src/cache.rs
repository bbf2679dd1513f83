//! Single-entry cache of the most recently opened dataset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gfs_common::RunSelector;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::dataset::{DatasetSource, ForecastDataset};
use crate::error::Result;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub replacements: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Holds at most one opened dataset, keyed by run selector.
///
/// A request for a different run replaces the entry. The lock is held while
/// opening so concurrent requests for the same run share one fetch.
pub struct DatasetCache<S> {
    source: S,
    entry: Mutex<Option<(RunSelector, Arc<ForecastDataset>)>>,
    hits: AtomicU64,
    misses: AtomicU64,
    replacements: AtomicU64,
}

impl<S: DatasetSource> DatasetCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entry: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            replacements: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the dataset for `run`, opening it on a miss.
    pub async fn load(&self, run: &RunSelector) -> Result<Arc<ForecastDataset>> {
        let mut entry = self.entry.lock().await;

        if let Some((cached_run, dataset)) = entry.as_ref() {
            if cached_run == run {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("dataset_cache_hits_total").increment(1);
                debug!(run = %run, "Dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dataset_cache_misses_total").increment(1);
        debug!(run = %run, "Dataset cache miss");

        let start = std::time::Instant::now();
        let dataset = Arc::new(self.source.open(run).await?);
        metrics::histogram!("dataset_open_duration_seconds").record(start.elapsed().as_secs_f64());

        if let Some((previous, _)) = entry.replace((*run, Arc::clone(&dataset))) {
            self.replacements.fetch_add(1, Ordering::Relaxed);
            info!(previous = %previous, run = %run, "Replaced cached dataset");
        }
        Ok(dataset)
    }

    /// Run selector of the cached dataset, if any.
    pub async fn cached_run(&self) -> Option<RunSelector> {
        self.entry.lock().await.as_ref().map(|(run, _)| *run)
    }

    pub async fn clear(&self) {
        *self.entry.lock().await = None;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
        }
    }
}
