//! Opening GFS datasets from a GrADS Data Server over DAP2.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gfs_common::time::TimeUnits;
use gfs_common::RunSelector;
use opendap::{hyperslab, ClientConfig, DecodedArray, OpendapClient, OpendapError};
use tracing::{info, instrument};

use crate::clip::Window;
use crate::dataset::{DatasetSource, ForecastDataset, SlabSource};
use crate::error::{DatasetError, Result};
use crate::field::Axis;

/// NOMADS GrADS Data Server host.
pub const DEFAULT_HOST: &str = "nomads.ncep.noaa.gov";

/// Product path of the 0.25° hourly GFS collection.
const PRODUCT_PATH: &str = "dods/gfs_0p25_1hr";

/// Dataset URL for a model run:
/// `https://{host}/dods/gfs_0p25_1hr/gfs{YYYYMMDD}/gfs_0p25_1hr_{HH}z`.
pub fn dataset_url(host: &str, run: &RunSelector) -> String {
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    };
    format!(
        "{}/{}/gfs{}/gfs_0p25_1hr_{}z",
        base,
        PRODUCT_PATH,
        run.date_compact(),
        run.run_cycle
    )
}

/// Dataset source backed by a GrADS Data Server.
#[derive(Debug, Clone)]
pub struct GdsLoader {
    client: OpendapClient,
    host: String,
}

impl GdsLoader {
    pub fn new(host: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let host = host.into();
        let client = OpendapClient::new(config).map_err(|source| DatasetError::OpenFailed {
            url: host.clone(),
            source,
        })?;
        Ok(Self { client, host })
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

fn take_array<'a>(arrays: &'a [DecodedArray], name: &str) -> Result<&'a DecodedArray> {
    arrays
        .iter()
        .find(|a| a.name() == name)
        .ok_or_else(|| DatasetError::invalid_metadata(format!("coordinate '{}' missing from response", name)))
}

#[async_trait]
impl DatasetSource for GdsLoader {
    #[instrument(skip(self), fields(run = %run))]
    async fn open(&self, run: &RunSelector) -> Result<ForecastDataset> {
        let url = dataset_url(&self.host, run);
        let open_failed = |source: OpendapError| DatasetError::OpenFailed {
            url: url.clone(),
            source,
        };

        let dds = self.client.fetch_dds(&url).await.map_err(open_failed)?;
        let das = self.client.fetch_das(&url).await.map_err(open_failed)?;
        let coords = self
            .client
            .fetch_data(&url, "time,lat,lon")
            .await
            .map_err(open_failed)?;

        let units = das
            .get("time", "units")
            .and_then(|a| a.as_str())
            .ok_or_else(|| DatasetError::invalid_metadata("time axis has no units"))?;
        let units = TimeUnits::parse(units)
            .map_err(|e| DatasetError::invalid_metadata(e.to_string()))?;
        let times = take_array(&coords, "time")?
            .values
            .to_f64()
            .into_iter()
            .map(|t| units.decode(t))
            .collect::<Vec<_>>();

        let lat = Axis::new(take_array(&coords, "lat")?.values.to_f64())
            .ok_or_else(|| DatasetError::invalid_metadata("latitude axis is not monotonic"))?;
        let lon = Axis::new(take_array(&coords, "lon")?.values.to_f64())
            .ok_or_else(|| DatasetError::invalid_metadata("longitude axis is not monotonic"))?;

        let variables: Vec<String> = dds
            .variable_names()
            .filter(|name| !matches!(*name, "time" | "lat" | "lon" | "lev"))
            .map(String::from)
            .collect();
        let fill_values: HashMap<String, f32> = variables
            .iter()
            .filter_map(|v| das.fill_value(v).map(|f| (v.clone(), f as f32)))
            .collect();

        info!(
            url = %url,
            steps = times.len(),
            lat = lat.len(),
            lon = lon.len(),
            lat_order = ?lat.order(),
            variables = variables.len(),
            "Opened dataset"
        );

        let source = Arc::new(RemoteSlabSource {
            client: self.client.clone(),
            url: url.clone(),
        });
        Ok(ForecastDataset::new(
            *run,
            url,
            times,
            lat,
            lon,
            variables,
            fill_values,
            source,
        ))
    }
}

/// Fetches slabs with `.dods` hyperslab requests.
struct RemoteSlabSource {
    client: OpendapClient,
    url: String,
}

#[async_trait]
impl SlabSource for RemoteSlabSource {
    async fn read_slab(&self, variable: &str, step: usize, window: &Window) -> Result<Vec<f32>> {
        let constraint = hyperslab(
            variable,
            &[step..step + 1, window.lat.clone(), window.lon.clone()],
        );
        let arrays = self
            .client
            .fetch_data(&self.url, &constraint)
            .await
            .map_err(|e| DatasetError::read_failed(variable, e.to_string()))?;

        let array = arrays
            .into_iter()
            .find(|a| a.name() == variable)
            .ok_or_else(|| DatasetError::read_failed(variable, "variable missing from response"))?;
        Ok(array.values.to_f32())
    }
}
