//! Application state and shared resources.

use std::sync::Arc;

use async_trait::async_trait;
use forecast::{DatasetCache, DatasetSource, ForecastDataset, GdsLoader, SyntheticSource};
use gfs_common::{Deployment, RunSelector};
use opendap::ClientConfig;
use renderer::MapRenderer;

use crate::metrics::ViewerMetrics;

/// Margin in degrees added around the region for offline data.
const OFFLINE_MARGIN: f64 = 2.0;

/// Where datasets come from.
pub enum ForecastSource {
    /// A GrADS Data Server.
    Remote(GdsLoader),
    /// Generated in memory; no network access.
    Synthetic(SyntheticSource),
}

impl ForecastSource {
    pub fn remote(host: &str, config: ClientConfig) -> forecast::Result<Self> {
        Ok(ForecastSource::Remote(GdsLoader::new(host, config)?))
    }

    /// Synthetic data on a 0-360 longitude grid covering the deployment region.
    pub fn offline(deployment: &Deployment) -> Self {
        let region = deployment.region.to_0_360();
        let lat = (
            (region.lat_min - OFFLINE_MARGIN).max(-90.0),
            (region.lat_max + OFFLINE_MARGIN).min(90.0),
        );
        let lon = (region.lon_min - OFFLINE_MARGIN, region.lon_max + OFFLINE_MARGIN);
        ForecastSource::Synthetic(SyntheticSource::gfs_like(lat, lon))
    }

    pub fn describe(&self) -> String {
        match self {
            ForecastSource::Remote(loader) => format!("remote ({})", loader.host()),
            ForecastSource::Synthetic(_) => "synthetic".to_string(),
        }
    }
}

#[async_trait]
impl DatasetSource for ForecastSource {
    async fn open(&self, run: &RunSelector) -> forecast::Result<ForecastDataset> {
        match self {
            ForecastSource::Remote(loader) => loader.open(run).await,
            ForecastSource::Synthetic(source) => source.open(run).await,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub cache: DatasetCache<ForecastSource>,
    pub renderer: Arc<MapRenderer>,
    pub metrics: Arc<ViewerMetrics>,
}

impl AppState {
    pub fn new(source: ForecastSource, renderer: MapRenderer) -> Self {
        Self {
            cache: DatasetCache::new(source),
            renderer: Arc::new(renderer),
            metrics: Arc::new(ViewerMetrics::new()),
        }
    }

    pub fn deployment(&self) -> &Deployment {
        self.renderer.deployment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfs_common::Region;

    fn run() -> RunSelector {
        RunSelector::new(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            gfs_common::RunCycle::Z06,
        )
    }

    #[tokio::test]
    async fn test_offline_grid_covers_western_region() {
        let mut deployment = Deployment::indonesia();
        deployment.region = Region::new(-10.0, 10.0, -40.0, -20.0);
        let source = ForecastSource::offline(&deployment);
        assert_eq!(source.describe(), "synthetic");

        let dataset = source.open(&run()).await.unwrap();
        assert_eq!(dataset.lon().extent(), Some((318.0, 342.0)));
    }

    #[tokio::test]
    async fn test_offline_source_opens_all_steps() {
        let source = ForecastSource::offline(&Deployment::indonesia());
        let dataset = source.open(&run()).await.unwrap();
        assert_eq!(dataset.times().len(), 241);
        assert!(dataset.has_variable("landsfc"));
        assert_eq!(dataset.lon().extent(), Some((88.0, 152.0)));
    }
}
