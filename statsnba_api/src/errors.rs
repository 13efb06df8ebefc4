//! Error types for the stats API client.

/// HTTP status codes the upstream uses for throttling and transient outages.
pub const RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors that can occur when building or making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request did not complete within the per-attempt timeout.
    #[error("Request timed out")]
    Timeout,
    /// The connection failed or was reset before a response arrived.
    #[error("Connection failed: {0}")]
    Connection(String),
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus {
        status: u16,
        /// Raw `Retry-After` header value, if the server sent one.
        retry_after: Option<String>,
        body: String,
    },
    /// The request URL could not be constructed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The response body was not valid JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// The JSON was valid but not shaped like a result set payload.
    #[error("Unexpected response shape: {0}")]
    Shape(String),
    /// A request parameter failed validation at construction time.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

impl Error {
    /// Whether another attempt of the same request could succeed.
    ///
    /// Timeouts, connection failures and the throttling/outage statuses in
    /// [`RETRY_STATUS_CODES`] are transient. Everything else is surfaced as is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout | Error::Connection(_) => true,
            Error::HttpStatus { status, .. } => RETRY_STATUS_CODES.contains(status),
            _ => false,
        }
    }

    /// The `Retry-After` header value carried by a failed response.
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Error::HttpStatus { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Connection(err.to_string())
        }
    }
}
