//! Normalized provider output, serialized as-is into the summary payload.

use serde::Serialize;

/// Minutes until a train arrives.
///
/// WMATA reports either a count or a status word such as `BRD` (boarding)
/// or `ARR` (arriving); status words pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Minutes {
    Count(i64),
    Status(String),
}

impl Minutes {
    /// Shown when the feed gives no minutes at all.
    pub fn unknown() -> Self {
        Minutes::Status("--".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RailArrival {
    pub line: Option<String>,
    pub dest: Option<String>,
    pub minutes: Minutes,
    pub cars: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RailStation {
    pub code: String,
    pub name: String,
    pub arrivals: Vec<RailArrival>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RailSection {
    pub stations: Vec<RailStation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusArrival {
    pub route: Option<String>,
    pub headsign: Option<String>,
    pub minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusStop {
    pub id: String,
    pub name: String,
    pub arrivals: Vec<BusArrival>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusSection {
    pub stops: Vec<BusStop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BikeStation {
    pub id: String,
    pub name: String,
    pub bikes: i64,
    pub docks: i64,
    pub ebikes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BikeSection {
    pub stations: Vec<BikeStation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temp_f: Option<f64>,
    pub wind_mph: Option<f64>,
    pub summary: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    /// Unix seconds.
    pub time: i64,
    pub temp_f: Option<f64>,
    /// Precipitation probability, percent.
    pub pop: Option<f64>,
    pub icon: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherAlert {
    pub event: Option<String>,
    pub severity: String,
    pub headline: Option<String>,
    pub ends: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incident {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub text: String,
}
