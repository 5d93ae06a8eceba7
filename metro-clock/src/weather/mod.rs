//! Weather sources: Open-Meteo forecasts and National Weather Service alerts.

mod client;
mod codes;
mod error;
mod types;

pub use client::{WeatherApi, WeatherClient, WeatherConfig};
pub use codes::{Condition, condition};
pub use error::WeatherError;
pub use types::{AlertProperties, CurrentWeatherDto, HourlyDto, HourlyResponse};
