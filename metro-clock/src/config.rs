//! Dashboard configuration.
//!
//! The YAML file only needs to list what differs from the defaults. Merging is
//! one level deep: a section given in the file keeps the default values of any
//! keys it leaves out, while scalars and lists replace the default wholesale.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "METRO_CLOCK_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// The only weather backend this service knows how to talk to.
pub const OPEN_METEO: &str = "open-meteo";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Home location that distance filters are measured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            lat: 38.8895,
            lon: -77.0353,
            radius_m: 1200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    /// Station codes to show instead of the nearest stations.
    pub favorites: Vec<String>,
    /// Line codes to keep. Empty keeps every line.
    pub lines: Vec<String>,
    pub refresh_s: u64,
    pub max_stations: usize,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            lines: Vec::new(),
            refresh_s: 15,
            max_stations: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    #[serde(deserialize_with = "ids")]
    pub favorites: Vec<String>,
    /// Stop ids that are always shown.
    #[serde(deserialize_with = "ids")]
    pub extra_stops: Vec<String>,
    /// Rail station codes whose nearby bus stops are shown.
    pub include_near_stations: Vec<String>,
    pub include_near_radius_m: u32,
    pub include_near_max_stops: usize,
    /// Route ids to keep. Empty keeps every route.
    #[serde(deserialize_with = "ids")]
    pub routes: Vec<String>,
    pub refresh_s: u64,
    pub max_stops: usize,
    pub max_arrivals: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            extra_stops: Vec::new(),
            include_near_stations: Vec::new(),
            include_near_radius_m: 250,
            include_near_max_stops: 3,
            routes: Vec::new(),
            refresh_s: 20,
            max_stops: 3,
            max_arrivals: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BikeShareConfig {
    pub enabled: bool,
    pub radius_m: f64,
    #[serde(deserialize_with = "ids")]
    pub favorites: Vec<String>,
    pub refresh_s: u64,
}

impl Default for BikeShareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius_m: 800.0,
            favorites: Vec::new(),
            refresh_s: 45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub provider: String,
    pub refresh_s: u64,
    /// Number of hourly forecast entries to return.
    pub hourly_hours: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: OPEN_METEO.to_string(),
            refresh_s: 600,
            hourly_hours: 12,
        }
    }
}

/// Display settings handed to the browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub layout: String,
    pub rotate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            layout: "combined".to_string(),
            rotate_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Upper bound on any single provider call within a summary.
    pub provider_timeout_s: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            provider_timeout_s: 15,
        }
    }
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub home: HomeConfig,
    pub rail: RailConfig,
    pub bus: BusConfig,
    pub bike_share: BikeShareConfig,
    pub weather: WeatherConfig,
    pub ui: UiConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a YAML file, merged over the defaults.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text, merged over the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let overrides: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let overrides =
            serde_json::to_value(overrides).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let overrides = match overrides {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(ConfigError::Invalid(
                    "top level must be a mapping".to_string(),
                ));
            }
        };

        let defaults = serde_json::to_value(Self::default())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let Value::Object(defaults) = defaults else {
            return Err(ConfigError::Invalid("defaults are not a mapping".to_string()));
        };

        let merged = shallow_merge(defaults, overrides);
        let config: Config = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let refreshes = [
            ("rail.refresh_s", self.rail.refresh_s),
            ("bus.refresh_s", self.bus.refresh_s),
            ("bike_share.refresh_s", self.bike_share.refresh_s),
            ("weather.refresh_s", self.weather.refresh_s),
            ("server.provider_timeout_s", self.server.provider_timeout_s),
        ];
        for (name, value) in refreshes {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }

        if self.weather.provider != OPEN_METEO {
            return Err(ConfigError::Invalid(format!(
                "unsupported weather provider: {}",
                self.weather.provider
            )));
        }

        Ok(())
    }

    pub fn rail_ttl(&self) -> Duration {
        Duration::from_secs(self.rail.refresh_s)
    }

    pub fn bus_ttl(&self) -> Duration {
        Duration::from_secs(self.bus.refresh_s)
    }

    pub fn bike_ttl(&self) -> Duration {
        Duration::from_secs(self.bike_share.refresh_s)
    }

    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(self.weather.refresh_s)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.server.provider_timeout_s)
    }
}

/// Merge `overrides` into `defaults`, one level deep.
///
/// When both sides hold a mapping for a key, the override's keys replace the
/// matching default keys and the rest survive. Any other value replaces the
/// default outright.
pub fn shallow_merge(mut defaults: Map<String, Value>, overrides: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overrides {
        match (defaults.get_mut(&key), value) {
            (Some(Value::Object(base)), Value::Object(section)) => {
                base.extend(section);
            }
            (_, value) => {
                defaults.insert(key, value);
            }
        }
    }
    defaults
}

/// Accept identifiers written either as strings or as bare numbers.
fn ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    let raw: Option<Vec<Id>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|id| match id {
            Id::Text(s) => s,
            Id::Int(n) => n.to_string(),
            Id::Float(f) => f.to_string(),
        })
        .collect())
}

/// Configuration re-read from disk on demand.
///
/// A reload that fails keeps serving the last configuration that loaded.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    path: PathBuf,
    current: Arc<RwLock<Arc<Config>>>,
}

impl ConfigSource {
    /// Load the initial configuration. Fails if the file exists but is invalid.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = Config::load(&path)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(Self {
            path,
            current: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    /// A source that never touches the filesystem.
    pub fn fixed(config: Config) -> Self {
        Self {
            path: PathBuf::new(),
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Re-read the file and return the configuration to use for this request.
    ///
    /// The file is read on the blocking pool.
    pub async fn reload(&self) -> Arc<Config> {
        if self.path.as_os_str().is_empty() {
            return self.current();
        }

        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || Config::load(path))
            .await
            .unwrap_or_else(|e| Err(ConfigError::Invalid(format!("reload task failed: {e}"))));

        match loaded {
            Ok(config) => {
                let config = Arc::new(config);
                let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
                if **current != *config {
                    info!(path = %self.path.display(), "configuration changed");
                }
                *current = config.clone();
                config
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config reload failed, keeping previous");
                self.current()
            }
        }
    }

    /// The most recently loaded configuration.
    pub fn current(&self) -> Arc<Config> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
