//! Provider error type.

use crate::gbfs::GbfsError;
use crate::weather::WeatherError;
use crate::wmata::WmataError;

/// Why a provider produced no data for a summary.
///
/// The `Display` text is what the dashboard shows after the provider name.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Transit(#[from] WmataError),

    #[error(transparent)]
    Bikeshare(#[from] GbfsError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}
