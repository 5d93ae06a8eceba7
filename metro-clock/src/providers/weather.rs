//! Current conditions, hourly forecast and active alerts for home.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tracing::debug;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::HomeConfig;
use crate::json::loose_int;
use crate::weather::{
    AlertProperties, CurrentWeatherDto, HourlyResponse, WeatherApi, WeatherClient, WeatherError,
    condition,
};

use super::types::{CurrentConditions, HourlyForecast, WeatherAlert};

const HOURLY_TTL: Duration = Duration::from_secs(600);
const ALERTS_TTL: Duration = Duration::from_secs(300);
const MAX_ALERTS: usize = 5;

/// Forecast hours that started longer ago than this are dropped.
const HOURLY_GRACE_SECS: i64 = 3600;

/// Open-Meteo's local-time format for hourly entries.
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub struct WeatherProvider<W = WeatherClient> {
    api: W,
    current: TtlCache<CurrentConditions>,
    hourly: TtlCache<Arc<HourlyResponse>>,
    alerts: TtlCache<Vec<WeatherAlert>>,
}

impl<W: WeatherApi> WeatherProvider<W> {
    pub fn new(api: W) -> Self {
        Self::with_clock(api, Arc::new(SystemClock))
    }

    pub fn with_clock(api: W, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            current: TtlCache::with_clock(clock.clone()),
            hourly: TtlCache::with_clock(clock.clone()),
            alerts: TtlCache::with_clock(clock),
        }
    }

    pub async fn now(
        &self,
        home: &HomeConfig,
        ttl: Duration,
    ) -> Result<CurrentConditions, WeatherError> {
        self.current
            .get_or_load("weather_current", ttl, move || async move {
                let dto = self.api.current(home.lat, home.lon).await?;
                Ok::<_, WeatherError>(current_conditions(dto))
            })
            .await
    }

    /// Up to `hours` forecast entries, starting with the current hour.
    pub async fn hourly(
        &self,
        home: &HomeConfig,
        hours: usize,
    ) -> Result<Vec<HourlyForecast>, WeatherError> {
        let resp = self
            .hourly
            .get_or_load("weather_hourly", HOURLY_TTL, move || async move {
                Ok::<_, WeatherError>(Arc::new(self.api.hourly(home.lat, home.lon).await?))
            })
            .await?;

        Ok(hourly_entries(&resp, Utc::now().timestamp(), hours))
    }

    pub async fn alerts(&self, home: &HomeConfig) -> Result<Vec<WeatherAlert>, WeatherError> {
        self.alerts
            .get_or_load("weather_alerts", ALERTS_TTL, move || async move {
                let alerts = self.api.alerts(home.lat, home.lon).await?;
                debug!(count = alerts.len(), "active weather alerts");
                Ok::<_, WeatherError>(alerts.into_iter().take(MAX_ALERTS).map(weather_alert).collect())
            })
            .await
    }
}

fn current_conditions(dto: CurrentWeatherDto) -> CurrentConditions {
    let cond = condition(dto.weathercode.as_ref().and_then(loose_int));
    CurrentConditions {
        temp_f: dto.temperature,
        wind_mph: dto.windspeed,
        summary: cond.summary.to_string(),
        icon: cond.icon.to_string(),
    }
}

/// Turn the parallel hourly series into forecast entries.
///
/// Times are local to the forecast location and are shifted back to UTC
/// with the response's offset. Entries more than an hour older than
/// `now_unix` and entries with unreadable times are skipped.
pub fn hourly_entries(resp: &HourlyResponse, now_unix: i64, hours: usize) -> Vec<HourlyForecast> {
    let Some(hourly) = &resp.hourly else {
        return Vec::new();
    };
    let offset = resp.utc_offset_seconds.unwrap_or(0);

    let len = hourly
        .time
        .len()
        .min(hourly.temperature_2m.len())
        .min(hourly.precipitation_probability.len())
        .min(hourly.weathercode.len());

    (0..len)
        .filter_map(|i| {
            let local = NaiveDateTime::parse_from_str(&hourly.time[i], HOURLY_TIME_FORMAT).ok()?;
            let time = local.and_utc().timestamp() - offset;
            if time + HOURLY_GRACE_SECS < now_unix {
                return None;
            }

            let cond = condition(hourly.weathercode[i].as_ref().and_then(loose_int));
            Some(HourlyForecast {
                time,
                temp_f: hourly.temperature_2m[i],
                pop: hourly.precipitation_probability[i],
                icon: cond.icon.to_string(),
                summary: cond.summary.to_string(),
            })
        })
        .take(hours)
        .collect()
}

fn weather_alert(props: AlertProperties) -> WeatherAlert {
    let headline = props
        .headline
        .filter(|h| !h.trim().is_empty())
        .or_else(|| props.parameters.nws_headline.into_iter().next());
    WeatherAlert {
        event: props.event,
        severity: props.severity.unwrap_or_default(),
        headline,
        ends: props.ends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::providers::mock::FakeWeather;
    use crate::weather::HourlyDto;
    use serde_json::json;

    /// 2024-06-01T12:00:00Z
    const NOON_UTC: i64 = 1_717_243_200;

    fn home() -> HomeConfig {
        HomeConfig::default()
    }

    fn series(times: &[&str]) -> HourlyResponse {
        HourlyResponse {
            utc_offset_seconds: Some(-4 * 3600),
            hourly: Some(HourlyDto {
                time: times.iter().map(|t| t.to_string()).collect(),
                temperature_2m: times.iter().map(|_| Some(70.0)).collect(),
                precipitation_probability: times.iter().map(|_| Some(20.0)).collect(),
                weathercode: times.iter().map(|_| Some(json!(3))).collect(),
            }),
        }
    }

    #[test]
    fn clear_and_unknown_codes() {
        let now = current_conditions(CurrentWeatherDto {
            temperature: Some(80.0),
            windspeed: Some(3.5),
            weathercode: Some(json!(0)),
        });
        assert_eq!(now.summary, "Clear");
        assert_eq!(now.icon, "☀️");

        let now = current_conditions(CurrentWeatherDto {
            weathercode: Some(json!(12345)),
            ..Default::default()
        });
        assert_eq!(now.summary, "Weather");
        assert_eq!(now.icon, "🌡️");
        assert_eq!(now.temp_f, None);
    }

    #[test]
    fn hourly_times_shift_by_utc_offset() {
        // 08:00 at UTC-4 is noon UTC.
        let entries = hourly_entries(&series(&["2024-06-01T08:00"]), NOON_UTC, 12);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time, NOON_UTC);
        assert_eq!(entries[0].summary, "Overcast");
        assert_eq!(entries[0].pop, Some(20.0));
    }

    #[test]
    fn hourly_drops_stale_entries() {
        let resp = series(&[
            "2024-06-01T06:00",
            "2024-06-01T07:00",
            "2024-06-01T08:00",
            "2024-06-01T09:00",
        ]);
        let entries = hourly_entries(&resp, NOON_UTC, 12);
        let times: Vec<_> = entries.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![NOON_UTC - 3600, NOON_UTC, NOON_UTC + 3600]);
    }

    #[test]
    fn hourly_caps_and_skips_bad_times() {
        let resp = series(&[
            "2024-06-01T08:00",
            "not a time",
            "2024-06-01T09:00",
            "2024-06-01T10:00",
        ]);
        let entries = hourly_entries(&resp, NOON_UTC, 2);
        let times: Vec<_> = entries.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![NOON_UTC, NOON_UTC + 3600]);
    }

    #[test]
    fn hourly_truncates_to_shortest_series() {
        let mut resp = series(&["2024-06-01T08:00", "2024-06-01T09:00"]);
        if let Some(h) = resp.hourly.as_mut() {
            h.weathercode.pop();
        }
        assert_eq!(hourly_entries(&resp, NOON_UTC, 12).len(), 1);
        assert!(hourly_entries(&HourlyResponse::default(), NOON_UTC, 12).is_empty());
    }

    #[test]
    fn alert_headline_falls_back_to_nws_headline() {
        let props: AlertProperties = serde_json::from_value(json!({
            "event": "Heat Advisory",
            "parameters": {"NWSheadline": ["HEAT ADVISORY IN EFFECT UNTIL 8 PM"]}
        }))
        .unwrap();
        let alert = weather_alert(props);
        assert_eq!(alert.headline.as_deref(), Some("HEAT ADVISORY IN EFFECT UNTIL 8 PM"));
        assert_eq!(alert.severity, "");
    }

    #[tokio::test]
    async fn alerts_are_capped() {
        let mut api = FakeWeather::new();
        api.alerts = (0..8)
            .map(|i| AlertProperties {
                event: Some(format!("Alert {i}")),
                severity: Some("Minor".into()),
                ..Default::default()
            })
            .collect();
        let provider = WeatherProvider::new(api);

        let alerts = provider.alerts(&home()).await.unwrap();
        assert_eq!(alerts.len(), 5);
        assert_eq!(alerts[0].event.as_deref(), Some("Alert 0"));
    }

    #[tokio::test]
    async fn alerts_refresh_every_five_minutes() {
        let clock = Arc::new(ManualClock::new());
        let provider = WeatherProvider::with_clock(FakeWeather::new(), clock.clone());

        provider.alerts(&home()).await.unwrap();
        clock.advance(Duration::from_secs(299));
        provider.alerts(&home()).await.unwrap();
        assert_eq!(provider.api.calls("alerts"), 1);

        clock.advance(Duration::from_secs(1));
        provider.alerts(&home()).await.unwrap();
        assert_eq!(provider.api.calls("alerts"), 2);
    }

    #[tokio::test]
    async fn hourly_ttl_ignores_configured_refresh() {
        let clock = Arc::new(ManualClock::new());
        let provider = WeatherProvider::with_clock(FakeWeather::new(), clock.clone());

        provider.now(&home(), Duration::from_secs(60)).await.unwrap();
        provider.hourly(&home(), 12).await.unwrap();

        clock.advance(Duration::from_secs(60));
        provider.now(&home(), Duration::from_secs(60)).await.unwrap();
        provider.hourly(&home(), 12).await.unwrap();
        assert_eq!(provider.api.calls("current"), 2);
        assert_eq!(provider.api.calls("hourly"), 1);

        clock.advance(Duration::from_secs(540));
        provider.hourly(&home(), 12).await.unwrap();
        assert_eq!(provider.api.calls("hourly"), 2);
    }
}
