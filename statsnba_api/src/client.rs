//! HTTP client for the stats.nba.com API.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::{
    query::Query,
    user_agent::{stats_headers, USER_AGENT},
    Error,
};

/// Production base URL. Endpoint paths are appended to it.
pub const DEFAULT_BASE_URL: &str = "https://stats.nba.com/stats";

/// HTTP client for the stats API.
///
/// Holds one `reqwest::Client` for its whole lifetime so keep-alive
/// connections and cookies are reused across calls. Each call is a single
/// attempt; pacing and retries belong to the caller.
pub struct Client {
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a new client pointing at the production stats API.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(stats_headers())
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Connection(e.to_string())
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, query: &dyn Query) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}/{}", self.base_api_url, query.endpoint()))
            .map_err(|e| {
                tracing::error!("Invalid URL constructed: {}", e);
                Error::InvalidUrl(e.to_string())
            })?;
        Ok(query.add_to_url(&url))
    }

    /// Issues one GET for the query and returns the decoded JSON body.
    pub async fn get_json(&self, query: &dyn Query) -> Result<Value, Error> {
        let url = self.get_url(query)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.map_err(Error::from_reqwest)?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                retry_after,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str::<Value>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Decode(e.to_string())
        })
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
