use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metro_clock::config::{CONFIG_PATH_ENV, ConfigSource, DEFAULT_CONFIG_PATH};
use metro_clock::gbfs::{GbfsClient, GbfsConfig};
use metro_clock::providers::{BikeshareProvider, TransitProvider, WeatherProvider};
use metro_clock::summary::Aggregator;
use metro_clock::weather::{WeatherClient, WeatherConfig};
use metro_clock::web::{AppState, create_router};
use metro_clock::wmata::{WmataClient, WmataConfig};

/// Static assets shipped with the crate.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metro_clock=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ConfigSource::open(config_path)?;

    // Transit sections report the missing key on every request.
    let api_key = std::env::var("WMATA_API_KEY").ok();
    if api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
        warn!("WMATA_API_KEY not set; rail, bus and incidents will be unavailable");
    }

    let wmata = WmataClient::new(WmataConfig::new(api_key))?;
    let gbfs = GbfsClient::new(GbfsConfig::default())?;
    let weather = WeatherClient::new(WeatherConfig::default())?;

    let aggregator = Aggregator::new(
        TransitProvider::new(wmata),
        BikeshareProvider::new(gbfs),
        WeatherProvider::new(weather),
    );

    let bind = config.current().server.bind.clone();
    let state = AppState::new(aggregator, config);
    let app = create_router(state, STATIC_DIR);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %listener.local_addr()?, "metro clock listening");
    axum::serve(listener, app).await?;

    Ok(())
}
