/// Errors that can occur when talking to the Grafana HTTP API.
///
/// The collectors collapse every variant into a single failed-scrape signal;
/// the variants exist so logs can tell an unreachable server apart from a
/// rejected request or a malformed payload.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure before a response was received.
    #[error("Grafana API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status code.
    #[error("Grafana API HTTP error: status={status}")]
    Status { status: u16 },

    /// The response body is not the expected JSON shape.
    #[error("Failed to decode Grafana API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URI could not be parsed. Only possible at
    /// client construction time.
    #[error("Invalid Grafana URI: {0}")]
    InvalidUri(String),
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, ClientError>;
