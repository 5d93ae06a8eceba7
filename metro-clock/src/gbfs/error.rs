//! GBFS client error types.

/// Errors that can occur when reading bikeshare feeds.
#[derive(Debug, thiserror::Error)]
pub enum GbfsError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse feed JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
