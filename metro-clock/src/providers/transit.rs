//! Rail, bus and incident adapters over the WMATA API.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::{Config, HomeConfig};
use crate::geo::haversine_m;
use crate::json::{id_string, loose_int};
use crate::wmata::{
    BusPredictionDto, IncidentDto, RailStationDto, TrainPredictionDto, TransitApi, WmataClient,
    WmataError,
};

use super::types::{
    BusArrival, BusSection, BusStop, Incident, Minutes, RailArrival, RailSection, RailStation,
};

/// Station metadata barely changes; refresh it daily.
const STATIONS_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const NEARBY_TTL: Duration = Duration::from_secs(10 * 60);
const INCIDENTS_TTL: Duration = Duration::from_secs(60);

/// Search radii for nearby stops when nothing else is configured.
const WIDENING_RADII_M: [u32; 2] = [3000, 5000];

/// Sort key for stops the API returns without a distance.
const UNKNOWN_DISTANCE_M: f64 = 999_999.0;

/// Name and position of a rail station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMeta {
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

type StationIndex = Arc<HashMap<String, StationMeta>>;

/// A stop found by a location search.
#[derive(Debug, Clone, PartialEq)]
struct NearbyStop {
    id: String,
    name: Option<String>,
    distance: f64,
}

/// Predictions for one stop, before route filtering.
#[derive(Debug, Clone)]
struct StopPredictions {
    name: Option<String>,
    arrivals: Vec<BusArrival>,
}

/// Transit adapter. Owns the caches for every WMATA-backed section.
pub struct TransitProvider<A = WmataClient> {
    api: A,
    stations: TtlCache<StationIndex>,
    rail: TtlCache<Vec<RailArrival>>,
    bus: TtlCache<StopPredictions>,
    nearby: TtlCache<Vec<NearbyStop>>,
    incidents: TtlCache<Vec<Incident>>,
}

impl<A: TransitApi> TransitProvider<A> {
    pub fn new(api: A) -> Self {
        Self::with_clock(api, Arc::new(SystemClock))
    }

    pub fn with_clock(api: A, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            stations: TtlCache::with_clock(clock.clone()),
            rail: TtlCache::with_clock(clock.clone()),
            bus: TtlCache::with_clock(clock.clone()),
            nearby: TtlCache::with_clock(clock.clone()),
            incidents: TtlCache::with_clock(clock),
        }
    }

    /// Arrivals at the favorite stations, or at the stations nearest home.
    pub async fn rail(&self, config: &Config) -> Result<RailSection, WmataError> {
        let index = self.station_index().await?;
        let codes = if config.rail.favorites.is_empty() {
            select_rail_codes(&index, &config.home, config.rail.max_stations)
        } else {
            config.rail.favorites.clone()
        };
        debug!(?codes, "rail stations");

        let ttl = config.rail_ttl();
        let arrivals = try_join_all(codes.iter().map(|code| self.rail_arrivals(code, ttl))).await?;

        let lines = &config.rail.lines;
        let stations = codes
            .into_iter()
            .zip(arrivals)
            .map(|(code, arrivals)| {
                let name = index
                    .get(&code)
                    .map(|meta| meta.name.clone())
                    .unwrap_or_else(|| code.clone());
                let arrivals = arrivals
                    .into_iter()
                    .filter(|a| {
                        lines.is_empty() || a.line.as_ref().is_some_and(|l| lines.contains(l))
                    })
                    .collect();
                RailStation {
                    code,
                    name,
                    arrivals,
                }
            })
            .collect();

        Ok(RailSection { stations })
    }

    /// Arrivals at configured stops, or at stops discovered near home.
    pub async fn bus(&self, config: &Config) -> Result<BusSection, WmataError> {
        let bus = &config.bus;
        let mut candidates: Vec<String> = bus
            .favorites
            .iter()
            .chain(&bus.extra_stops)
            .cloned()
            .collect();
        let mut lookup_names: HashMap<String, String> = HashMap::new();
        let mut remember = |stops: Vec<NearbyStop>, candidates: &mut Vec<String>| {
            for stop in stops {
                if let Some(name) = stop.name {
                    lookup_names.entry(stop.id.clone()).or_insert(name);
                }
                candidates.push(stop.id);
            }
        };

        if !bus.include_near_stations.is_empty() {
            let index = self.station_index().await?;
            for code in &bus.include_near_stations {
                let Some((lat, lon)) = index.get(code).and_then(|m| Some((m.lat?, m.lon?))) else {
                    warn!(code = %code, "no coordinates for rail station, skipping nearby stops");
                    continue;
                };
                let (radius, limit) = (bus.include_near_radius_m, bus.include_near_max_stops);
                let key = format!("bus_near_{code}_{radius}_{limit}");
                let stops = self
                    .nearby
                    .get_or_load(&key, NEARBY_TTL, move || self.stops_near(lat, lon, radius, limit))
                    .await?;
                remember(stops, &mut candidates);
            }
        }

        if candidates.is_empty() {
            let stops = self
                .nearby
                .get_or_load("bus_nearby", NEARBY_TTL, move || self.stops_near_home(config))
                .await?;
            remember(stops, &mut candidates);
        }

        let ids = unique_stop_ids(candidates);
        let ttl = config.bus_ttl();
        let predictions = try_join_all(ids.iter().map(|id| self.stop_predictions(id, ttl))).await?;

        let routes = &bus.routes;
        let stops = ids
            .into_iter()
            .zip(predictions)
            .map(|(id, predictions)| {
                let name = predictions
                    .name
                    .or_else(|| lookup_names.get(&id).cloned())
                    .unwrap_or_else(|| format!("Stop {id}"));
                let arrivals = predictions
                    .arrivals
                    .into_iter()
                    .filter(|a| {
                        routes.is_empty() || a.route.as_ref().is_some_and(|r| routes.contains(r))
                    })
                    .take(bus.max_arrivals)
                    .collect();
                BusStop { id, name, arrivals }
            })
            .collect();

        Ok(BusSection { stops })
    }

    /// Current service incidents.
    pub async fn incidents(&self) -> Result<Vec<Incident>, WmataError> {
        self.incidents
            .get_or_load("incidents", INCIDENTS_TTL, move || async move {
                let incidents = self.api.incidents().await?;
                Ok::<_, WmataError>(incidents.into_iter().map(incident).collect())
            })
            .await
    }

    async fn rail_arrivals(&self, code: &str, ttl: Duration) -> Result<Vec<RailArrival>, WmataError> {
        self.rail
            .get_or_load(&format!("rail_{code}"), ttl, move || async move {
                let trains = self.api.rail_predictions(code).await?;
                Ok::<_, WmataError>(trains.into_iter().map(rail_arrival).collect())
            })
            .await
    }

    async fn stop_predictions(&self, id: &str, ttl: Duration) -> Result<StopPredictions, WmataError> {
        self.bus
            .get_or_load(&format!("bus_{id}"), ttl, move || async move {
                let resp = self.api.bus_predictions(id).await?;
                Ok::<_, WmataError>(StopPredictions {
                    name: resp.stop_name.filter(|n| !n.trim().is_empty()),
                    arrivals: resp.predictions.into_iter().map(bus_arrival).collect(),
                })
            })
            .await
    }

    async fn station_index(&self) -> Result<StationIndex, WmataError> {
        self.stations
            .get_or_load("stations_meta", STATIONS_TTL, move || async move {
                let stations = self.api.stations().await?;
                Ok::<_, WmataError>(Arc::new(index_stations(stations)))
            })
            .await
    }

    /// Stops within `radius_m` of a point, nearest first.
    async fn stops_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<NearbyStop>, WmataError> {
        let mut stops: Vec<NearbyStop> = self
            .api
            .stops_near(lat, lon, radius_m)
            .await?
            .into_iter()
            .filter_map(|dto| {
                let id = id_string(dto.stop_id.as_ref());
                (!id.is_empty()).then(|| NearbyStop {
                    id,
                    name: dto.name.filter(|n| !n.trim().is_empty()),
                    distance: dto.distance.unwrap_or(UNKNOWN_DISTANCE_M),
                })
            })
            .collect();

        stops.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        stops.truncate(limit);
        Ok(stops)
    }

    /// Widen the search around home until some stop turns up.
    async fn stops_near_home(&self, config: &Config) -> Result<Vec<NearbyStop>, WmataError> {
        let home = &config.home;
        let base = home.radius_m.max(0.0) as u32;
        let mut radii = vec![base];
        radii.extend(WIDENING_RADII_M.iter().map(|r| (*r).max(base)));
        radii.dedup();

        for radius in radii {
            let stops = self
                .stops_near(home.lat, home.lon, radius, config.bus.max_stops)
                .await?;
            if !stops.is_empty() {
                debug!(radius, count = stops.len(), "found bus stops near home");
                return Ok(stops);
            }
        }

        warn!("no bus stops found near home");
        Ok(Vec::new())
    }
}

fn index_stations(stations: Vec<RailStationDto>) -> HashMap<String, StationMeta> {
    stations
        .into_iter()
        .filter_map(|s| {
            let code = s.code.filter(|c| !c.is_empty())?;
            let name = s.name.unwrap_or_else(|| code.clone());
            Some((
                code,
                StationMeta {
                    name,
                    lat: s.lat,
                    lon: s.lon,
                },
            ))
        })
        .collect()
}

/// Pick the stations nearest home.
///
/// Stations within the home radius come first, nearest first, up to
/// `max_stations`. When none are in range the single nearest station is
/// used instead, however far away it is. Stations without coordinates are
/// never picked.
pub fn select_rail_codes(
    stations: &HashMap<String, StationMeta>,
    home: &HomeConfig,
    max_stations: usize,
) -> Vec<String> {
    if max_stations == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(f64, &String)> = stations
        .iter()
        .filter_map(|(code, meta)| {
            let d = haversine_m(home.lat, home.lon, meta.lat?, meta.lon?);
            (!d.is_nan()).then_some((d, code))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let within: Vec<String> = ranked
        .iter()
        .take_while(|(d, _)| *d <= home.radius_m)
        .take(max_stations)
        .map(|(_, code)| (*code).clone())
        .collect();

    if within.is_empty() {
        ranked.first().map(|(_, code)| (*code).clone()).into_iter().collect()
    } else {
        within
    }
}

/// Drop repeated stop ids, keeping the first occurrence of each.
pub fn unique_stop_ids(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn rail_arrival(dto: TrainPredictionDto) -> RailArrival {
    let minutes = match dto.min {
        Some(raw) => match loose_int(&raw) {
            Some(n) => Minutes::Count(n),
            None => match raw {
                Value::String(s) if !s.trim().is_empty() => Minutes::Status(s),
                _ => Minutes::unknown(),
            },
        },
        None => Minutes::unknown(),
    };

    RailArrival {
        line: dto.line,
        dest: dto.destination_name,
        minutes,
        cars: dto.car.as_ref().and_then(loose_int),
    }
}

fn bus_arrival(dto: BusPredictionDto) -> BusArrival {
    BusArrival {
        route: dto.route_id,
        headsign: dto.direction_text.or(dto.trip_headsign),
        minutes: dto.minutes.as_ref().and_then(loose_int),
    }
}

fn incident(dto: IncidentDto) -> Incident {
    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    Incident {
        kind: non_empty(dto.incident_type)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "rail".to_string()),
        severity: non_empty(dto.severity)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "info".to_string()),
        text: non_empty(dto.description).unwrap_or_else(|| "Service advisory".to_string()),
    }
}
