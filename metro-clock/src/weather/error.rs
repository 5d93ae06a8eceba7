//! Weather client error types.

/// Errors that can occur when fetching forecasts or alerts.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
