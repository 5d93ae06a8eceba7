//! In-memory stand-ins for the upstream clients.
//!
//! Each fake records the calls it receives so tests can assert on how often
//! the upstream was hit.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;

use crate::gbfs::{
    BikeshareApi, DiscoveryResponse, GbfsError, StationInformationDto, StationStatusDto,
};
use crate::weather::{AlertProperties, CurrentWeatherDto, HourlyResponse, WeatherApi, WeatherError};
use crate::wmata::{
    BusPredictionDto, BusPredictionsResponse, BusStopDto, IncidentDto, RailStationDto,
    TrainPredictionDto, TransitApi, WmataError,
};

/// Default home latitude; fixtures are placed due north of it.
pub const HOME_LAT: f64 = 38.8895;
pub const HOME_LON: f64 = -77.0353;

/// Meters per degree of latitude on the haversine sphere.
const M_PER_DEG_LAT: f64 = 111_194.93;

/// Latitude of a point `meters` due north of home.
pub fn lat_north_of_home(meters: f64) -> f64 {
    HOME_LAT + meters / M_PER_DEG_LAT
}

#[derive(Default)]
struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    fn count(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Fake WMATA API.
#[derive(Default)]
pub struct FakeTransit {
    pub stations: Vec<RailStationDto>,
    pub trains: HashMap<String, Vec<TrainPredictionDto>>,
    /// Stops returned by a location search, keyed by search radius.
    pub stops_by_radius: HashMap<u32, Vec<BusStopDto>>,
    pub buses: HashMap<String, BusPredictionsResponse>,
    pub incidents: Vec<IncidentDto>,
    pub fail_bus: bool,
    pub missing_key: bool,
    calls: CallLog,
}

impl FakeTransit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_station(mut self, code: &str, name: &str, meters_north: f64) -> Self {
        self.stations.push(RailStationDto {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            lat: Some(lat_north_of_home(meters_north)),
            lon: Some(HOME_LON),
        });
        self
    }

    pub fn with_train(mut self, code: &str, line: &str, dest: &str, min: &str) -> Self {
        self.trains
            .entry(code.to_string())
            .or_default()
            .push(TrainPredictionDto {
                line: Some(line.to_string()),
                destination_name: Some(dest.to_string()),
                min: Some(json!(min)),
                car: Some(json!("8")),
            });
        self
    }

    pub fn with_stops(mut self, radius: u32, stops: &[(&str, &str, f64)]) -> Self {
        self.stops_by_radius.insert(
            radius,
            stops
                .iter()
                .map(|(id, name, distance)| BusStopDto {
                    stop_id: Some(json!(id)),
                    name: Some(name.to_string()),
                    lat: None,
                    lon: None,
                    distance: Some(*distance),
                })
                .collect(),
        );
        self
    }

    pub fn with_bus(mut self, stop_id: &str, stop_name: Option<&str>, routes: &[(&str, i64)]) -> Self {
        self.buses.insert(
            stop_id.to_string(),
            BusPredictionsResponse {
                stop_name: stop_name.map(String::from),
                predictions: routes
                    .iter()
                    .map(|(route, minutes)| BusPredictionDto {
                        route_id: Some(route.to_string()),
                        direction_text: Some(format!("{route} outbound")),
                        trip_headsign: None,
                        minutes: Some(json!(minutes)),
                    })
                    .collect(),
            },
        );
        self
    }

    pub fn calls(&self, prefix: &str) -> usize {
        self.calls.count(prefix)
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.all()
    }

    fn check_key(&self) -> Result<(), WmataError> {
        if self.missing_key {
            Err(WmataError::MissingApiKey)
        } else {
            Ok(())
        }
    }
}

impl TransitApi for FakeTransit {
    async fn stations(&self) -> Result<Vec<RailStationDto>, WmataError> {
        self.calls.record("stations");
        self.check_key()?;
        Ok(self.stations.clone())
    }

    async fn rail_predictions(&self, code: &str) -> Result<Vec<TrainPredictionDto>, WmataError> {
        self.calls.record(format!("rail:{code}"));
        self.check_key()?;
        Ok(self.trains.get(code).cloned().unwrap_or_default())
    }

    async fn stops_near(
        &self,
        _lat: f64,
        _lon: f64,
        radius_m: u32,
    ) -> Result<Vec<BusStopDto>, WmataError> {
        self.calls.record(format!("stops:{radius_m}"));
        self.check_key()?;
        Ok(self.stops_by_radius.get(&radius_m).cloned().unwrap_or_default())
    }

    async fn bus_predictions(&self, stop_id: &str) -> Result<BusPredictionsResponse, WmataError> {
        self.calls.record(format!("bus:{stop_id}"));
        self.check_key()?;
        if self.fail_bus {
            return Err(WmataError::Api {
                status: 500,
                message: "NextBus unavailable".to_string(),
            });
        }
        Ok(self.buses.get(stop_id).cloned().unwrap_or_default())
    }

    async fn incidents(&self) -> Result<Vec<IncidentDto>, WmataError> {
        self.calls.record("incidents");
        self.check_key()?;
        Ok(self.incidents.clone())
    }
}

/// Fake GBFS feeds.
pub struct FakeBikeshare {
    pub discovery: DiscoveryResponse,
    pub info: Vec<StationInformationDto>,
    pub status: Vec<StationStatusDto>,
    calls: CallLog,
}

impl FakeBikeshare {
    pub fn new() -> Self {
        let discovery = DiscoveryResponse {
            data: Some(json!({"en": {"feeds": [
                {"name": "station_information", "url": "https://bikes.test/info.json"},
                {"name": "station_status", "url": "https://bikes.test/status.json"}
            ]}})),
        };
        Self {
            discovery,
            info: Vec::new(),
            status: Vec::new(),
            calls: CallLog::default(),
        }
    }

    /// Add a station `meters_north` of home with the given counts.
    pub fn with_station(mut self, id: &str, meters_north: f64, bikes: i64, docks: i64) -> Self {
        self.info.push(StationInformationDto {
            station_id: Some(json!(id)),
            name: Some(format!("Dock {id}")),
            lat: Some(lat_north_of_home(meters_north)),
            lon: Some(HOME_LON),
        });
        self.status.push(StationStatusDto {
            station_id: Some(json!(id)),
            num_bikes_available: Some(bikes),
            num_docks_available: Some(docks),
            num_ebikes_available: Some(0),
            vehicle_types_available: Vec::new(),
        });
        self
    }

    pub fn calls(&self, prefix: &str) -> usize {
        self.calls.count(prefix)
    }
}

impl BikeshareApi for FakeBikeshare {
    async fn discovery(&self) -> Result<DiscoveryResponse, GbfsError> {
        self.calls.record("discovery");
        Ok(self.discovery.clone())
    }

    async fn station_information(&self, url: &str) -> Result<Vec<StationInformationDto>, GbfsError> {
        self.calls.record(format!("info:{url}"));
        Ok(self.info.clone())
    }

    async fn station_status(&self, url: &str) -> Result<Vec<StationStatusDto>, GbfsError> {
        self.calls.record(format!("status:{url}"));
        Ok(self.status.clone())
    }
}

/// Fake weather API.
#[derive(Default)]
pub struct FakeWeather {
    pub current: CurrentWeatherDto,
    pub hourly: HourlyResponse,
    pub alerts: Vec<AlertProperties>,
    /// Delay applied to every call, to exercise timeouts.
    pub delay: Option<Duration>,
    calls: CallLog,
}

impl FakeWeather {
    pub fn new() -> Self {
        Self {
            current: CurrentWeatherDto {
                temperature: Some(72.5),
                windspeed: Some(4.0),
                weathercode: Some(json!(0)),
            },
            ..Self::default()
        }
    }

    pub fn calls(&self, prefix: &str) -> usize {
        self.calls.count(prefix)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl WeatherApi for FakeWeather {
    async fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentWeatherDto, WeatherError> {
        self.calls.record("current");
        self.pause().await;
        Ok(self.current.clone())
    }

    async fn hourly(&self, _lat: f64, _lon: f64) -> Result<HourlyResponse, WeatherError> {
        self.calls.record("hourly");
        self.pause().await;
        Ok(self.hourly.clone())
    }

    async fn alerts(&self, _lat: f64, _lon: f64) -> Result<Vec<AlertProperties>, WeatherError> {
        self.calls.record("alerts");
        self.pause().await;
        Ok(self.alerts.clone())
    }
}
