//! HTTP client for DAP2 endpoints.

use std::ops::Range;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::das::Das;
use crate::dds::Dds;
use crate::error::{OpendapError, OpendapResult};
use crate::xdr::{decode_response, server_error_message, DecodedArray};

/// Configuration for the DAP2 client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout, body included
    pub request_timeout: Duration,
    /// Value of the User-Agent header
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: concat!("opendap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for one or more DAP2 dataset URLs.
///
/// `dataset_url` arguments are the dataset base URL without a suffix,
/// e.g. `https://host/dods/gfs_0p25_1hr/gfs20240115/gfs_0p25_1hr_00z`.
#[derive(Debug, Clone)]
pub struct OpendapClient {
    client: Client,
}

impl OpendapClient {
    pub fn new(config: ClientConfig) -> OpendapResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch and parse the dataset structure.
    #[instrument(skip(self))]
    pub async fn fetch_dds(&self, dataset_url: &str) -> OpendapResult<Dds> {
        let body = self.get(&format!("{}.dds", dataset_url)).await?;
        Dds::parse(&text_body(&body)?)
    }

    /// Fetch and parse the dataset attributes.
    #[instrument(skip(self))]
    pub async fn fetch_das(&self, dataset_url: &str) -> OpendapResult<Das> {
        let body = self.get(&format!("{}.das", dataset_url)).await?;
        Das::parse(&text_body(&body)?)
    }

    /// Fetch binary data for a constraint expression such as
    /// `time,lat,lon` or `tmp2m[3:3][400:520][360:600]`.
    #[instrument(skip(self))]
    pub async fn fetch_data(
        &self,
        dataset_url: &str,
        constraint: &str,
    ) -> OpendapResult<Vec<DecodedArray>> {
        let url = format!("{}.dods?{}", dataset_url, constraint);
        let body = self.get(&url).await?;
        let (_, arrays) = decode_response(&body)?;
        debug!(arrays = arrays.len(), bytes = body.len(), "Decoded DAP2 response");
        Ok(arrays)
    }

    async fn get(&self, url: &str) -> OpendapResult<Bytes> {
        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if let Some(message) = server_error_message(&body) {
            return Err(OpendapError::Server(message));
        }
        if !status.is_success() {
            return Err(OpendapError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(body)
    }
}

fn text_body(body: &[u8]) -> OpendapResult<String> {
    String::from_utf8(body.to_vec())
        .map_err(|e| OpendapError::Parse(format!("response is not UTF-8: {}", e)))
}

/// Build a hyperslab constraint `var[a:b][c:d]` from half-open ranges.
///
/// DAP2 hyperslab bounds are inclusive, so each range end is decremented.
/// Empty ranges are clamped to a single index.
pub fn hyperslab(variable: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::from(variable);
    for range in ranges {
        let last = range.end.saturating_sub(1).max(range.start);
        out.push_str(&format!("[{}:{}]", range.start, last));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperslab_inclusive_bounds() {
        assert_eq!(hyperslab("tmp2m", &[3..4, 300..421, 360..601]), "tmp2m[3:3][300:420][360:600]");
    }

    #[test]
    fn test_hyperslab_scalar_variable() {
        assert_eq!(hyperslab("time", &[]), "time");
    }

    #[test]
    fn test_default_timeouts() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(OpendapClient::new(config).is_ok());
    }
}
