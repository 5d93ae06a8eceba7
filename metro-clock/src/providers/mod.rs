//! Provider adapters.
//!
//! Each adapter wraps one upstream client, caches its responses and turns
//! them into the normalized shapes the dashboard renders. Adapters return
//! errors; deciding what to show instead is the aggregator's job.

mod bikeshare;
mod error;
mod transit;
mod types;
mod weather;

#[cfg(test)]
pub(crate) mod mock;

pub use bikeshare::{BikeshareProvider, StationInfo, resolve_ebikes, select_bike_stations};
pub use error::ProviderError;
pub use transit::{StationMeta, TransitProvider, select_rail_codes, unique_stop_ids};
pub use types::*;
pub use weather::{WeatherProvider, hourly_entries};
