//! The dashboard summary and the aggregator that builds it.
//!
//! Every provider runs concurrently under its own timeout. A provider that
//! fails or times out contributes an empty section and one line in
//! `errors`; it never takes the rest of the summary down with it.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{error, info};

use crate::config::Config;
use crate::gbfs::{BikeshareApi, GbfsClient};
use crate::providers::{
    BikeSection, BikeshareProvider, BusSection, CurrentConditions, HourlyForecast, Incident,
    ProviderError, RailSection, TransitProvider, WeatherAlert, WeatherProvider,
};
use crate::weather::{WeatherApi, WeatherClient};
use crate::wmata::{TransitApi, WmataClient};

/// Everything the dashboard shows, as served by `/v1/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Unix seconds when the summary was assembled.
    pub updated_at: i64,
    pub rail: RailSection,
    pub bus: BusSection,
    pub bike: BikeSection,
    pub weather: WeatherSection,
    pub incidents: Vec<Incident>,
    /// One `"{provider}: {message}"` line per failed provider.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WeatherSection {
    /// Serialized as `{}` when current conditions are unavailable.
    #[serde(serialize_with = "conditions_or_empty")]
    pub now: Option<CurrentConditions>,
    pub hourly: Vec<HourlyForecast>,
    pub alerts: Vec<WeatherAlert>,
}

fn conditions_or_empty<S: Serializer>(
    now: &Option<CurrentConditions>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match now {
        Some(conditions) => conditions.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Fans a summary request out to every provider.
pub struct Aggregator<T = WmataClient, B = GbfsClient, W = WeatherClient> {
    transit: TransitProvider<T>,
    bikeshare: BikeshareProvider<B>,
    weather: WeatherProvider<W>,
}

impl<T, B, W> Aggregator<T, B, W>
where
    T: TransitApi,
    B: BikeshareApi,
    W: WeatherApi,
{
    pub fn new(
        transit: TransitProvider<T>,
        bikeshare: BikeshareProvider<B>,
        weather: WeatherProvider<W>,
    ) -> Self {
        Self {
            transit,
            bikeshare,
            weather,
        }
    }

    /// Build a summary for `config`. Never fails; see [`Summary::errors`].
    pub async fn build_summary(&self, config: &Config) -> Summary {
        let limit = config.provider_timeout();
        let home = &config.home;

        let bike = async {
            if config.bike_share.enabled {
                guarded(limit, self.bikeshare.stations(config)).await
            } else {
                Ok(BikeSection::default())
            }
        };

        let (rail, bus, bike, now, hourly, alerts, incidents) = tokio::join!(
            guarded(limit, self.transit.rail(config)),
            guarded(limit, self.transit.bus(config)),
            bike,
            guarded(limit, self.weather.now(home, config.weather_ttl())),
            guarded(limit, self.weather.hourly(home, config.weather.hourly_hours)),
            guarded(limit, self.weather.alerts(home)),
            guarded(limit, self.transit.incidents()),
        );

        let mut errors = Vec::new();
        let summary = Summary {
            updated_at: Utc::now().timestamp(),
            rail: settle("wmata_rail", rail, &mut errors),
            bus: settle("wmata_bus", bus, &mut errors),
            bike: settle("bikeshare", bike, &mut errors),
            weather: WeatherSection {
                now: settle("weather_now", now.map(Some), &mut errors),
                hourly: settle("weather_hourly", hourly, &mut errors),
                alerts: settle("weather_alerts", alerts, &mut errors),
            },
            incidents: settle("wmata_incidents", incidents, &mut errors),
            errors,
        };

        info!(
            rail = summary.rail.stations.len(),
            bus = summary.bus.stops.len(),
            bike = summary.bike.stations.len(),
            errors = summary.errors.len(),
            "built summary"
        );
        summary
    }
}

/// Run a provider call with an upper bound on how long it may take.
async fn guarded<V, E>(
    limit: Duration,
    call: impl Future<Output = Result<V, E>>,
) -> Result<V, ProviderError>
where
    ProviderError: From<E>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ProviderError::from),
        Err(_) => Err(ProviderError::Timeout {
            secs: limit.as_secs(),
        }),
    }
}

/// Unwrap a provider result, recording a failure and substituting the
/// empty section.
fn settle<V: Default>(
    provider: &str,
    result: Result<V, ProviderError>,
    errors: &mut Vec<String>,
) -> V {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(provider, error = %e, "provider failed");
            errors.push(format!("{provider}: {e}"));
            V::default()
        }
    }
}
