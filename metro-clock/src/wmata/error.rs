//! WMATA client error types.

use std::fmt;

use reqwest::StatusCode;

/// Longest slice of an unparseable body kept for the error message.
const BODY_SNIPPET_CHARS: usize = 500;

#[derive(Debug)]
pub enum WmataError {
    /// `WMATA_API_KEY` was absent, so nothing was sent.
    MissingApiKey,

    /// The key cannot be sent as a header value.
    InvalidApiKey,

    Http(reqwest::Error),

    /// The response was not the JSON shape we expected.
    Json {
        message: String,
        body: Option<String>,
    },

    Api { status: u16, message: String },

    RateLimited,

    /// 401 or 403: the key was rejected.
    Unauthorized,
}

impl WmataError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WmataError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => WmataError::RateLimited,
            _ => WmataError::Api {
                status: status.as_u16(),
                message: body,
            },
        }
    }

    /// A decode failure, keeping the start of the offending body.
    pub fn decode(err: serde_json::Error, body: &str) -> Self {
        WmataError::Json {
            message: err.to_string(),
            body: Some(body.chars().take(BODY_SNIPPET_CHARS).collect()),
        }
    }
}

impl fmt::Display for WmataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WmataError::MissingApiKey => write!(f, "WMATA_API_KEY not set"),
            WmataError::InvalidApiKey => write!(f, "WMATA_API_KEY is not a valid header value"),
            WmataError::Http(e) => write!(f, "HTTP error: {e}"),
            WmataError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            WmataError::Api { status, message } => write!(f, "API error {status}: {message}"),
            WmataError::RateLimited => write!(f, "WMATA rate limit reached"),
            WmataError::Unauthorized => write!(f, "WMATA rejected the API key"),
        }
    }
}

impl std::error::Error for WmataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WmataError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WmataError {
    fn from(err: reqwest::Error) -> Self {
        WmataError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            WmataError::from_status(StatusCode::FORBIDDEN, String::new()),
            WmataError::Unauthorized
        ));
        assert!(matches!(
            WmataError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            WmataError::Unauthorized
        ));
        assert!(matches!(
            WmataError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            WmataError::RateLimited
        ));

        let err = WmataError::from_status(StatusCode::BAD_GATEWAY, "upstream down".into());
        assert_eq!(err.to_string(), "API error 502: upstream down");
    }

    #[test]
    fn decode_error_keeps_body_snippet() {
        let body = format!("<html>{}</html>", "x".repeat(1000));
        let parse_err = serde_json::from_str::<serde_json::Value>(&body).unwrap_err();

        let WmataError::Json { body: Some(snippet), .. } = WmataError::decode(parse_err, &body)
        else {
            panic!("expected a decode error");
        };
        assert_eq!(snippet.chars().count(), 500);
        assert!(snippet.starts_with("<html>"));
    }

    #[test]
    fn missing_key_message_names_the_variable() {
        assert_eq!(WmataError::MissingApiKey.to_string(), "WMATA_API_KEY not set");
    }
}
