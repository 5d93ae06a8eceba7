//! Open-Meteo and NWS response DTOs.

use serde::Deserialize;
use serde_json::Value;

use crate::json::nullable_list;

/// Open-Meteo response with `current_weather=true`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentResponse {
    pub current_weather: Option<CurrentWeatherDto>,
}

/// The `current_weather` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentWeatherDto {
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub weathercode: Option<Value>,
}

/// Open-Meteo response with an `hourly` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyResponse {
    /// Offset of the location's timezone; `time` entries are local to it.
    pub utc_offset_seconds: Option<i64>,
    pub hourly: Option<HourlyDto>,
}

/// Parallel hourly series. Entries line up by index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyDto {
    /// Local times formatted `YYYY-MM-DDTHH:MM`.
    #[serde(default, deserialize_with = "nullable_list")]
    pub time: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub weathercode: Vec<Option<Value>>,
}

/// NWS `alerts/active` GeoJSON response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertsResponse {
    #[serde(default, deserialize_with = "nullable_list")]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFeature {
    #[serde(default)]
    pub properties: AlertProperties,
}

/// The fields of an alert we display.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertProperties {
    pub event: Option<String>,
    pub severity: Option<String>,
    pub headline: Option<String>,
    /// ISO 8601 end time.
    pub ends: Option<String>,
    #[serde(default)]
    pub parameters: AlertParameters,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertParameters {
    #[serde(rename = "NWSheadline", default, deserialize_with = "nullable_list")]
    pub nws_headline: Vec<String>,
}
