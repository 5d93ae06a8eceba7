//! WMATA API response DTOs.
//!
//! Field names follow the API's PascalCase. Everything is optional, and
//! lists tolerate both absence and `null`.

use serde::Deserialize;
use serde_json::Value;

use crate::json::nullable_list;

/// Response from `Rail.svc/json/jStations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StationsResponse {
    #[serde(default, deserialize_with = "nullable_list")]
    pub stations: Vec<RailStationDto>,
}

/// A rail station from the station list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RailStationDto {
    /// Station code, e.g. `A01`.
    pub code: Option<String>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Response from `StationPrediction.svc/json/GetPrediction/{code}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictionsResponse {
    #[serde(default, deserialize_with = "nullable_list")]
    pub trains: Vec<TrainPredictionDto>,
}

/// One predicted train arrival.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainPredictionDto {
    /// Line code (`RD`, `BL`, ...) or `--` for non-revenue trains.
    pub line: Option<String>,
    pub destination_name: Option<String>,
    /// Minutes to arrival: a number, `ARR`, `BRD`, or empty.
    pub min: Option<Value>,
    /// Number of cars, or `-` when unknown.
    pub car: Option<Value>,
}

/// Response from `Bus.svc/json/jStops`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopsResponse {
    #[serde(default, deserialize_with = "nullable_list")]
    pub stops: Vec<BusStopDto>,
}

/// A bus stop returned by a location search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusStopDto {
    /// Stop id; a string in practice, occasionally a number.
    #[serde(rename = "StopID")]
    pub stop_id: Option<Value>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Distance in meters from the search point.
    pub distance: Option<f64>,
}

/// Response from `NextBusService.svc/json/jPredictions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusPredictionsResponse {
    pub stop_name: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub predictions: Vec<BusPredictionDto>,
}

/// One predicted bus arrival.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusPredictionDto {
    #[serde(rename = "RouteID")]
    pub route_id: Option<String>,
    pub direction_text: Option<String>,
    pub trip_headsign: Option<String>,
    pub minutes: Option<Value>,
}

/// Response from `Incidents.svc/json/Incidents`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncidentsResponse {
    #[serde(default, deserialize_with = "nullable_list")]
    pub incidents: Vec<IncidentDto>,
}

/// A service incident.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncidentDto {
    pub incident_type: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
}
