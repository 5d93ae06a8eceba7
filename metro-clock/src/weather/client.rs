//! Weather HTTP client.
//!
//! Forecasts come from Open-Meteo in Fahrenheit and mph. Alerts come from the
//! National Weather Service, which rejects requests without a descriptive
//! `User-Agent`.

use std::future::Future;

use serde::de::DeserializeOwned;

use super::error::WeatherError;
use super::types::{
    AlertProperties, AlertsResponse, CurrentResponse, CurrentWeatherDto, HourlyResponse,
};

const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_ALERTS_URL: &str = "https://api.weather.gov/alerts/active";
const DEFAULT_USER_AGENT: &str = "metro-clock/1.0 (+https://github.com/jamesdahall/metro_clock)";

/// The weather endpoints the providers depend on.
pub trait WeatherApi: Send + Sync {
    /// Current conditions at a point.
    fn current(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<CurrentWeatherDto, WeatherError>> + Send;

    /// Two days of hourly forecast at a point.
    fn hourly(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<HourlyResponse, WeatherError>> + Send;

    /// Alerts active at a point.
    fn alerts(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<Vec<AlertProperties>, WeatherError>> + Send;
}

/// Configuration for the weather client.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub forecast_url: String,
    pub alerts_url: String,
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            alerts_url: DEFAULT_ALERTS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Client for Open-Meteo and NWS.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    forecast_url: String,
    alerts_url: String,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            forecast_url: config.forecast_url,
            alerts_url: config.alerts_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| WeatherError::Json {
            message: e.to_string(),
        })
    }
}

fn current_url(base: &str, lat: f64, lon: f64) -> String {
    format!(
        "{base}?latitude={lat}&longitude={lon}\
         &current_weather=true&temperature_unit=fahrenheit&windspeed_unit=mph"
    )
}

fn hourly_url(base: &str, lat: f64, lon: f64) -> String {
    format!(
        "{base}?latitude={lat}&longitude={lon}\
         &hourly=temperature_2m,precipitation_probability,weathercode\
         &forecast_days=2&timezone=auto&temperature_unit=fahrenheit&windspeed_unit=mph"
    )
}

fn alerts_url(base: &str, lat: f64, lon: f64) -> String {
    format!("{base}?point={lat},{lon}")
}

impl WeatherApi for WeatherClient {
    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentWeatherDto, WeatherError> {
        let resp: CurrentResponse = self
            .get_json(&current_url(&self.forecast_url, lat, lon))
            .await?;
        Ok(resp.current_weather.unwrap_or_default())
    }

    async fn hourly(&self, lat: f64, lon: f64) -> Result<HourlyResponse, WeatherError> {
        self.get_json(&hourly_url(&self.forecast_url, lat, lon))
            .await
    }

    async fn alerts(&self, lat: f64, lon: f64) -> Result<Vec<AlertProperties>, WeatherError> {
        let resp: AlertsResponse = self
            .get_json(&alerts_url(&self.alerts_url, lat, lon))
            .await?;
        Ok(resp.features.into_iter().map(|f| f.properties).collect())
    }
}
