//! WMATA HTTP client.

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::error::WmataError;
use super::types::{
    BusPredictionsResponse, BusStopDto, IncidentDto, IncidentsResponse, PredictionsResponse,
    RailStationDto, StationsResponse, StopsResponse, TrainPredictionDto,
};

/// Default base URL for the WMATA API.
const DEFAULT_BASE_URL: &str = "https://api.wmata.com";

/// The transit endpoints the providers depend on.
///
/// Implemented by [`WmataClient`] and by in-memory fakes in tests.
pub trait TransitApi: Send + Sync {
    /// All rail stations.
    fn stations(&self) -> impl Future<Output = Result<Vec<RailStationDto>, WmataError>> + Send;

    /// Next trains at a rail station.
    fn rail_predictions(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Vec<TrainPredictionDto>, WmataError>> + Send;

    /// Bus stops within `radius_m` of a point.
    fn stops_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
    ) -> impl Future<Output = Result<Vec<BusStopDto>, WmataError>> + Send;

    /// Next buses at a stop.
    fn bus_predictions(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<BusPredictionsResponse, WmataError>> + Send;

    /// Current rail and bus incidents.
    fn incidents(&self) -> impl Future<Output = Result<Vec<IncidentDto>, WmataError>> + Send;
}

/// Configuration for the WMATA client.
#[derive(Debug, Clone)]
pub struct WmataConfig {
    /// API key sent in the `api_key` header. `None` makes every call fail.
    pub api_key: Option<String>,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl WmataConfig {
    /// Create a new config. Blank keys count as missing.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// WMATA API client.
#[derive(Debug, Clone)]
pub struct WmataClient {
    http: reqwest::Client,
    base_url: String,
    has_key: bool,
}

impl WmataClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WmataConfig) -> Result<Self, WmataError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| WmataError::InvalidApiKey)?;
            headers.insert("api_key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            has_key: config.api_key.is_some(),
        })
    }

    /// GET `url` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WmataError> {
        if !self.has_key {
            return Err(WmataError::MissingApiKey);
        }

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WmataError::from_status(status, body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| WmataError::decode(e, &body))
    }
}

fn stations_url(base: &str) -> String {
    format!("{base}/Rail.svc/json/jStations")
}

fn rail_predictions_url(base: &str, code: &str) -> String {
    format!("{base}/StationPrediction.svc/json/GetPrediction/{code}")
}

fn stops_url(base: &str, lat: f64, lon: f64, radius_m: u32) -> String {
    format!("{base}/Bus.svc/json/jStops?lat={lat}&lon={lon}&radius={radius_m}")
}

fn bus_predictions_url(base: &str, stop_id: &str) -> String {
    format!("{base}/NextBusService.svc/json/jPredictions?StopID={stop_id}")
}

fn incidents_url(base: &str) -> String {
    format!("{base}/Incidents.svc/json/Incidents")
}

impl TransitApi for WmataClient {
    async fn stations(&self) -> Result<Vec<RailStationDto>, WmataError> {
        let resp: StationsResponse = self.get_json(&stations_url(&self.base_url)).await?;
        Ok(resp.stations)
    }

    async fn rail_predictions(&self, code: &str) -> Result<Vec<TrainPredictionDto>, WmataError> {
        let resp: PredictionsResponse = self
            .get_json(&rail_predictions_url(&self.base_url, code))
            .await?;
        Ok(resp.trains)
    }

    async fn stops_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
    ) -> Result<Vec<BusStopDto>, WmataError> {
        let resp: StopsResponse = self
            .get_json(&stops_url(&self.base_url, lat, lon, radius_m))
            .await?;
        Ok(resp.stops)
    }

    async fn bus_predictions(&self, stop_id: &str) -> Result<BusPredictionsResponse, WmataError> {
        self.get_json(&bus_predictions_url(&self.base_url, stop_id))
            .await
    }

    async fn incidents(&self) -> Result<Vec<IncidentDto>, WmataError> {
        let resp: IncidentsResponse = self.get_json(&incidents_url(&self.base_url)).await?;
        Ok(resp.incidents)
    }
}
