//! Bikeshare station availability from a GBFS system.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::{BikeShareConfig, Config, HomeConfig};
use crate::gbfs::{BikeshareApi, GbfsClient, GbfsError, StationStatusDto};
use crate::geo::haversine_m;
use crate::json::id_string;

use super::types::{BikeSection, BikeStation};

const FEEDS_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const INFO_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Stations shown when no favorites are configured.
const NEAREST_STATIONS: usize = 3;

const INFO_FEED: &str = "station_information";
const STATUS_FEED: &str = "station_status";

/// Static description of a dock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationInfo {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

type FeedUrls = Arc<HashMap<String, String>>;
type InfoIndex = Arc<HashMap<String, StationInfo>>;

pub struct BikeshareProvider<B = GbfsClient> {
    api: B,
    feeds: TtlCache<FeedUrls>,
    info: TtlCache<InfoIndex>,
    status: TtlCache<Arc<Vec<StationStatusDto>>>,
}

impl<B: BikeshareApi> BikeshareProvider<B> {
    pub fn new(api: B) -> Self {
        Self::with_clock(api, Arc::new(SystemClock))
    }

    pub fn with_clock(api: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            feeds: TtlCache::with_clock(clock.clone()),
            info: TtlCache::with_clock(clock.clone()),
            status: TtlCache::with_clock(clock),
        }
    }

    /// Availability at the favorite docks, or at the docks nearest home.
    pub async fn stations(&self, config: &Config) -> Result<BikeSection, GbfsError> {
        let feeds = self.feed_urls().await?;
        let (info, status) = tokio::try_join!(
            self.station_info(&feeds),
            self.station_status(&feeds, config.bike_ttl())
        )?;

        let stations = select_bike_stations(&info, &status, &config.home, &config.bike_share);
        debug!(count = stations.len(), "bike stations selected");
        Ok(BikeSection { stations })
    }

    async fn feed_urls(&self) -> Result<FeedUrls, GbfsError> {
        self.feeds
            .get_or_load("gbfs_feeds", FEEDS_TTL, move || async move {
                let discovery = self.api.discovery().await?;
                Ok::<_, GbfsError>(Arc::new(discovery.feed_urls()))
            })
            .await
    }

    async fn station_info(&self, feeds: &HashMap<String, String>) -> Result<InfoIndex, GbfsError> {
        let Some(url) = feeds.get(INFO_FEED) else {
            warn!("discovery document lists no {INFO_FEED} feed");
            return Ok(InfoIndex::default());
        };

        self.info
            .get_or_load("gbfs_station_info", INFO_TTL, move || async move {
                let stations = self.api.station_information(url).await?;
                let index = stations
                    .into_iter()
                    .map(|s| {
                        let info = StationInfo {
                            name: s.name,
                            lat: s.lat,
                            lon: s.lon,
                        };
                        (id_string(s.station_id.as_ref()), info)
                    })
                    .collect();
                Ok::<_, GbfsError>(Arc::new(index))
            })
            .await
    }

    async fn station_status(
        &self,
        feeds: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<Arc<Vec<StationStatusDto>>, GbfsError> {
        let Some(url) = feeds.get(STATUS_FEED) else {
            warn!("discovery document lists no {STATUS_FEED} feed");
            return Ok(Arc::default());
        };

        self.status
            .get_or_load("gbfs_status", ttl, move || async move {
                Ok::<_, GbfsError>(Arc::new(self.api.station_status(url).await?))
            })
            .await
    }
}

/// Choose which docks to show.
///
/// Favorites are shown in feed order wherever they are. Without favorites,
/// the three nearest docks within `radius_m` of home are shown.
pub fn select_bike_stations(
    info: &HashMap<String, StationInfo>,
    status: &[StationStatusDto],
    home: &HomeConfig,
    config: &BikeShareConfig,
) -> Vec<BikeStation> {
    if !config.favorites.is_empty() {
        return status
            .iter()
            .filter_map(|s| {
                let id = id_string(s.station_id.as_ref());
                config
                    .favorites
                    .contains(&id)
                    .then(|| bike_station(id, s, info))
            })
            .collect();
    }

    let mut nearby: Vec<(f64, &StationStatusDto, String)> = status
        .iter()
        .filter_map(|s| {
            let id = id_string(s.station_id.as_ref());
            let meta = info.get(&id)?;
            let d = haversine_m(home.lat, home.lon, meta.lat?, meta.lon?);
            (d <= config.radius_m).then_some((d, s, id))
        })
        .collect();
    nearby.sort_by(|a, b| a.0.total_cmp(&b.0));

    nearby
        .into_iter()
        .take(NEAREST_STATIONS)
        .map(|(_, s, id)| bike_station(id, s, info))
        .collect()
}

fn bike_station(
    id: String,
    status: &StationStatusDto,
    info: &HashMap<String, StationInfo>,
) -> BikeStation {
    let name = info
        .get(&id)
        .and_then(|meta| meta.name.clone())
        .unwrap_or_else(|| format!("Station {id}"));
    BikeStation {
        name,
        bikes: status.num_bikes_available.unwrap_or(0),
        docks: status.num_docks_available.unwrap_or(0),
        ebikes: resolve_ebikes(status),
        id,
    }
}

/// E-bikes docked at a station.
///
/// Older feeds report `num_ebikes_available`; newer ones break availability
/// down by vehicle type instead.
pub fn resolve_ebikes(status: &StationStatusDto) -> i64 {
    if let Some(n) = status.num_ebikes_available {
        return n;
    }

    status
        .vehicle_types_available
        .iter()
        .find(|vt| {
            vt.vehicle_type_id
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains("ebike"))
        })
        .and_then(|vt| vt.count)
        .unwrap_or(0)
}
