//! GBFS HTTP client.

use std::future::Future;

use serde::de::DeserializeOwned;

use super::error::GbfsError;
use super::types::{DiscoveryResponse, StationInformationDto, StationStatusDto, StationsFeed};

/// Capital Bikeshare's discovery document.
const DEFAULT_DISCOVERY_URL: &str = "https://gbfs.capitalbikeshare.com/gbfs/gbfs.json";

/// The bikeshare feeds the providers depend on.
pub trait BikeshareApi: Send + Sync {
    /// The discovery document listing every sub-feed.
    fn discovery(&self) -> impl Future<Output = Result<DiscoveryResponse, GbfsError>> + Send;

    /// The `station_information` feed at `url`.
    fn station_information(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Vec<StationInformationDto>, GbfsError>> + Send;

    /// The `station_status` feed at `url`.
    fn station_status(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Vec<StationStatusDto>, GbfsError>> + Send;
}

/// Configuration for the GBFS client.
#[derive(Debug, Clone)]
pub struct GbfsConfig {
    /// URL of `gbfs.json`
    pub discovery_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GbfsConfig {
    pub fn with_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_url = url.into();
        self
    }
}

impl Default for GbfsConfig {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Client for a GBFS system. Feeds are public; no credentials.
#[derive(Debug, Clone)]
pub struct GbfsClient {
    http: reqwest::Client,
    discovery_url: String,
}

impl GbfsClient {
    pub fn new(config: GbfsConfig) -> Result<Self, GbfsError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            discovery_url: config.discovery_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GbfsError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GbfsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| GbfsError::Json {
            message: e.to_string(),
        })
    }
}

impl BikeshareApi for GbfsClient {
    async fn discovery(&self) -> Result<DiscoveryResponse, GbfsError> {
        self.get_json(&self.discovery_url).await
    }

    async fn station_information(&self, url: &str) -> Result<Vec<StationInformationDto>, GbfsError> {
        let feed: StationsFeed<StationInformationDto> = self.get_json(url).await?;
        Ok(feed.data.stations)
    }

    async fn station_status(&self, url: &str) -> Result<Vec<StationStatusDto>, GbfsError> {
        let feed: StationsFeed<StationStatusDto> = self.get_json(url).await?;
        Ok(feed.data.stations)
    }
}
